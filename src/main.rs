use anyhow::Result;
use clap::Parser;
use memecaster::bot::{BotHandler, CommandListener, Messenger, TelegramClient};
use memecaster::cli::{CliOptions, Command};
use memecaster::models::Config;
use memecaster::pipeline::Pipeline;
use memecaster::web;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn setup_logging(debug: bool) {
    let default_filter = if debug {
        "memecaster=debug,tower_http=debug"
    } else {
        "memecaster=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: CliOptions) -> Result<()> {
    let config = Config::from_env()?;
    let port = cli.command.resolve_port(config.port);
    let pipeline = Arc::new(Pipeline::from_config(&config)?);

    match cli.command {
        Command::Serve { .. } => {
            let app = web::create_generate_router(pipeline);
            web::setup_server(&config.listen_address, port, app).await
        }
        Command::Bot { .. } => {
            let token = config.require_telegram_token()?.to_string();
            let messenger: Arc<dyn Messenger> = Arc::new(
                TelegramClient::new(token).with_base_url(config.telegram_api_base.clone()),
            );

            tokio::spawn(CommandListener::new(Arc::clone(&messenger)).run());

            let handler = Arc::new(BotHandler::new(pipeline, messenger));
            let app = web::create_bot_router(handler);
            web::setup_server(&config.listen_address, port, app).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliOptions::parse();
    setup_logging(cli.debug);

    info!("Starting memecaster ({:?})", cli.command);

    match run(cli).await {
        Ok(_) => {
            info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            error!("memecaster failed: {}", e);
            std::process::exit(1);
        }
    }
}
