//! HTTP surfaces for both transports.
//!
//! `serve` mounts [`create_generate_router`], which returns the PNG in the
//! response. `bot` mounts [`create_bot_router`], which accepts a job and
//! delivers the result to a Telegram chat later.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::{debug, error, info, Level};

use crate::bot::BotHandler;
use crate::models::{GenerationRequest, TriggerRequest};
use crate::pipeline::Pipeline;

mod error;

pub use error::{ApiError, GENERATION_FAILED};

async fn health_handler() -> &'static str {
    "ok"
}

async fn generate_handler(
    State(pipeline): State<Arc<Pipeline>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let png = pipeline.generate(&request).await?;
    Ok(([(CONTENT_TYPE, "image/png")], png))
}

async fn trigger_handler(
    State(handler): State<Arc<BotHandler>>,
    payload: Result<Json<TriggerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(trigger) = payload?;
    let (chat_id, request) = trigger.into_parts()?;

    info!("Accepted generation job for chat {}", chat_id);
    tokio::spawn(async move {
        if let Err(e) = handler.handle_trigger(chat_id.clone(), request).await {
            debug!("Job for chat {} did not complete: {}", chat_id, e);
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

// 5xx responses were already logged by the pipeline.
fn trace_failures_as_warnings() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::WARN))
}

/// Router for `POST /api/generate`. Other methods on the path get 405.
pub fn create_generate_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(trace_failures_as_warnings())
        .with_state(pipeline)
}

/// Router for the bot's `POST /img` trigger.
pub fn create_bot_router(handler: Arc<BotHandler>) -> Router {
    Router::new()
        .route("/img", post(trigger_handler))
        .route("/health", get(health_handler))
        .layer(trace_failures_as_warnings())
        .with_state(handler)
}

pub async fn setup_server(listen_addr: &str, port: u16, app: Router) -> Result<(), anyhow::Error> {
    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| anyhow::anyhow!("Server error on {}: {}", addr, err))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ai::{MockCaptionClient, MockImageSynthesisClient};
    use crate::bot::{MockMessenger, SentItem};
    use crate::image::MockCompositor;
    use crate::pipeline::PipelineServices;
    use crate::testing::ErrorCounter;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Harness {
        caption: MockCaptionClient,
        image_gen: MockImageSynthesisClient,
        compositor: MockCompositor,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                caption: MockCaptionClient::new()
                    .with_caption_response("cool cat, no regrets".to_string()),
                image_gen: MockImageSynthesisClient::new(),
                compositor: MockCompositor::new(),
            }
        }

        fn pipeline(&self) -> Arc<Pipeline> {
            Arc::new(Pipeline::with_services(PipelineServices {
                caption: Box::new(self.caption.clone()),
                image_gen: Box::new(self.image_gen.clone()),
                compositor: Box::new(self.compositor.clone()),
            }))
        }
    }

    async fn read_body(response: axum::response::Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
            .to_vec()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn generate_returns_png_body() {
        let harness = Harness::new();
        let app = create_generate_router(harness.pipeline());

        let response = app
            .oneshot(json_post("/api/generate", r#"{"prompt":"a cat wearing sunglasses"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert_eq!(read_body(response).await, b"composite:cool cat, no regrets");
        assert_eq!(
            harness.caption.get_prompts(),
            vec!["a cat wearing sunglasses".to_string()]
        );
    }

    #[tokio::test]
    async fn get_on_generate_is_method_not_allowed() {
        let harness = Harness::new();
        let app = create_generate_router(harness.pipeline());

        let request = Request::builder()
            .method("GET")
            .uri("/api/generate")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(harness.caption.get_call_count(), 0);
        assert_eq!(harness.image_gen.get_call_count(), 0);
        assert_eq!(harness.compositor.get_call_count(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_returns_generic_json_error() {
        let harness = Harness {
            image_gen: MockImageSynthesisClient::new().with_failure(true),
            ..Harness::new()
        };
        let app = create_generate_router(harness.pipeline());

        let response = app
            .oneshot(json_post("/api/generate", r#"{"prompt":"a cat"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
        assert_eq!(body, json!({ "error": GENERATION_FAILED }));
        assert_eq!(harness.compositor.get_call_count(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_logged_once() {
        let (errors, _guard) = ErrorCounter::install();
        let harness = Harness {
            caption: MockCaptionClient::new().with_failure(true),
            ..Harness::new()
        };
        let app = create_generate_router(harness.pipeline());

        let response = app
            .oneshot(json_post("/api/generate", r#"{"prompt":"a cat"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors.count(), 1);
    }

    #[tokio::test]
    async fn blank_or_malformed_prompt_is_bad_request() {
        let harness = Harness::new();
        let app = create_generate_router(harness.pipeline());

        for body in [r#"{"prompt":"   "}"#, r#"{}"#, "not json"] {
            let response = app
                .clone()
                .oneshot(json_post("/api/generate", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
        assert_eq!(harness.caption.get_call_count(), 0);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = create_generate_router(Harness::new().pipeline());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, b"ok");
    }

    #[tokio::test]
    async fn trigger_accepts_and_delivers_photo() {
        let harness = Harness::new();
        let messenger = MockMessenger::new();
        let handler = Arc::new(BotHandler::new(
            harness.pipeline(),
            Arc::new(messenger.clone()),
        ));
        let app = create_bot_router(handler);

        let response = app
            .oneshot(json_post("/img", r#"{"prompt":"a cat","chatId":"42"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let mut delivered = false;
        for _ in 0..100 {
            if messenger
                .get_sent()
                .iter()
                .any(|item| matches!(item, SentItem::Delete { .. }))
            {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(delivered, "job never finished: {:?}", messenger.get_sent());
        assert!(messenger.get_sent().iter().any(|item| matches!(
            item,
            SentItem::Photo { bytes, .. } if bytes == b"composite:cool cat, no regrets"
        )));
    }

    #[tokio::test]
    async fn setup_server_reports_bind_failure() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let app = create_generate_router(Harness::new().pipeline());

        let result = setup_server("127.0.0.1", port, app).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn trigger_without_chat_id_is_rejected() {
        let harness = Harness::new();
        let messenger = MockMessenger::new();
        let handler = Arc::new(BotHandler::new(
            harness.pipeline(),
            Arc::new(messenger.clone()),
        ));
        let app = create_bot_router(handler);

        let response = app
            .oneshot(json_post("/img", r#"{"prompt":"a cat"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(messenger.get_sent().is_empty());
    }
}
