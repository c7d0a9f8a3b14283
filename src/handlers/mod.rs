pub mod index;
pub mod page;

pub use index::*;
pub use page::*;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};

use crate::models::{PipelineError, Result};
use crate::pipeline::InferencePipeline;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<InferencePipeline>,
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(pipeline: Arc<InferencePipeline>) -> Result<Self> {
        Ok(Self {
            pipeline,
            pages: Arc::new(PageRenderer::new()?),
        })
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Inference(_)
            | PipelineError::Storage(_)
            | PipelineError::Configuration(_)
            | PipelineError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Builds the full application router: pages, static files, health and metrics
pub fn router(state: AppState) -> Router {
    let cfg = state.pipeline.config();
    let uploads = ServeDir::new(&cfg.upload_folder);
    let processed = ServeDir::new(&cfg.processed_folder);
    let body_limit = cfg.max_upload_bytes();

    Router::new()
        .route("/", get(index_page).post(submit_upload))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest_service(&cfg.uploads_url_prefix(), uploads)
        .nest_service(&cfg.processed_url_prefix(), processed)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO))
                        .make_span_with(|req: &Request<_>| {
                            let id = nanoid::nanoid!(8);
                            tracing::info_span!(
                                "http.request",
                                req.id = %id,
                                http.method = %req.method(),
                                http.path = %req.uri().path(),
                                user_agent = req.headers().get("user-agent").and_then(|v| v.to_str().ok()),
                            )
                        }),
                )
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_handler() -> (StatusCode, String) {
    let json = crate::metrics::export_metrics_json();
    let body = serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string());
    (StatusCode::OK, body)
}
