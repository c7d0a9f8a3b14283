use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::handlers::AppState;
use crate::metrics;
use crate::models::{PipelineError, Result, UploadedImage};

/// GET / renders the empty upload form
pub async fn index_page(State(state): State<AppState>) -> Response {
    match state.pages.render_index(None, None) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render index page");
            e.into_response()
        }
    }
}

/// POST / classifies the uploaded `file` field and renders the result
pub async fn submit_upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    match classify_upload(&state, multipart).await {
        Ok(html) => {
            metrics::record_prediction_ok();
            Html(html).into_response()
        }
        Err(e) => {
            metrics::record_failure(e.kind());
            if e.is_client_error() {
                tracing::warn!(error = %e, kind = e.kind(), "Upload rejected");
            } else {
                tracing::error!(error = %e, kind = e.kind(), "Upload failed");
            }
            e.into_response()
        }
    }
}

async fn classify_upload(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<String> {
    // A body that is not multipart at all carries no file either
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Request is not multipart");
        PipelineError::no_file_selected()
    })?;

    let upload = read_file_field(multipart).await?;
    tracing::debug!(file = %upload.file_name, bytes = upload.bytes.len(), "Received upload");

    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.process_upload(upload))
        .await
        .map_err(|e| PipelineError::Inference(format!("pipeline task failed: {}", e)))??;

    state
        .pages
        .render_index(Some(&result.image_url), Some(&result.label))
}

/// Pulls the first `file` field that carries a filename
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedImage> {
    loop {
        let field = multipart.next_field().await.map_err(upload_error)?;
        let Some(field) = field else {
            return Err(PipelineError::no_file_selected());
        };

        if field.name() != Some("file") {
            continue;
        }
        // Plain form values named `file` are not file uploads
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(PipelineError::no_file_selected());
        }

        let bytes = field.bytes().await.map_err(upload_error)?;
        return Ok(UploadedImage::new(file_name, bytes.to_vec()));
    }
}

fn upload_error(e: MultipartError) -> PipelineError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PipelineError::PayloadTooLarge(e.body_text())
    } else {
        PipelineError::Validation(format!("Malformed upload: {}", e.body_text()))
    }
}
