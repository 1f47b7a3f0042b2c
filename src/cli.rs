//! CLI parser
use clap::{Parser, Subcommand};

pub const DEFAULT_SERVE_PORT: u16 = 3001;
pub const DEFAULT_BOT_PORT: u16 = 3000;

#[derive(Parser, Debug)]
#[command(name = "memecaster")]
#[command(about = "Caption and illustrate a prompt as a single meme image")]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "MEMECASTER_DEBUG")]
    /// Enable debug logging. Env: MEMECASTER_DEBUG
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve `POST /api/generate`, returning the PNG directly.
    Serve {
        #[clap(long, short)]
        /// Listen port, overrides `PORT`. Defaults to 3001.
        port: Option<u16>,
    },
    /// Run the Telegram bot and its `POST /img` trigger.
    Bot {
        #[clap(long, short)]
        /// Listen port, overrides `PORT`. Defaults to 3000.
        port: Option<u16>,
    },
}

impl Command {
    /// Picks the flag, then the configured port, then the per-mode default.
    pub fn resolve_port(&self, configured: Option<u16>) -> u16 {
        match self {
            Command::Serve { port } => port.or(configured).unwrap_or(DEFAULT_SERVE_PORT),
            Command::Bot { port } => port.or(configured).unwrap_or(DEFAULT_BOT_PORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_port() {
        let cli = CliOptions::try_parse_from(["memecaster", "serve", "--port", "8080"]).unwrap();
        assert_eq!(cli.command, Command::Serve { port: Some(8080) });
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CliOptions::try_parse_from(["memecaster"]).is_err());
    }

    #[test]
    fn test_port_resolution_order() {
        let serve = Command::Serve { port: None };
        assert_eq!(serve.resolve_port(None), DEFAULT_SERVE_PORT);
        assert_eq!(serve.resolve_port(Some(9000)), 9000);

        let bot = Command::Bot { port: Some(4000) };
        assert_eq!(bot.resolve_port(Some(9000)), 4000);
        assert_eq!(Command::Bot { port: None }.resolve_port(None), DEFAULT_BOT_PORT);
    }
}
