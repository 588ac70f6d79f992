//! Handlers for QR image batch submission and status.
//!
//! Submission persists a batch row and hands its process id to the
//! in-process dispatcher; rendering happens in the background. Status is
//! read straight from the batch row.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dialbatch_core::error::CoreError;
use dialbatch_core::render::RenderConfig;
use dialbatch_db::models::batch::CreateBatch;
use dialbatch_db::models::status::BatchStatus;
use dialbatch_db::repositories::BatchRepo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitImageBatch {
    /// Codes to render, one image each.
    #[validate(length(min = 1, message = "dialcodes must not be empty"))]
    pub dialcodes: Vec<String>,
    /// Rendering options; missing fields take defaults.
    pub config: Option<Value>,
    #[validate(length(min = 1, message = "channel must not be empty"))]
    pub channel: String,
    #[validate(length(min = 1, message = "publisher must not be empty"))]
    pub publisher: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub process_id: String,
}

#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/dialcodes/images
///
/// Persist the batch, enqueue it for rendering, and return its process id.
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitImageBatch>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if input.dialcodes.iter().any(|c| c.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "dialcodes must not contain blank entries".into(),
        ));
    }

    // Normalize the config up front so the stored form is what the cache
    // compares against later.
    let config = RenderConfig::from_value(input.config.as_ref().unwrap_or(&Value::Null));

    let process_id = Uuid::now_v7().to_string();

    let batch = BatchRepo::create(
        &state.pool,
        &CreateBatch {
            process_id: process_id.clone(),
            dialcodes: input.dialcodes.clone(),
            config: config.to_config_value(),
            channel: input.channel.clone(),
            publisher: input.publisher.clone(),
        },
    )
    .await?;

    state.dispatch.submit(&batch.process_id);

    tracing::info!(
        process_id = %batch.process_id,
        codes = input.dialcodes.len(),
        channel = %input.channel,
        "Image batch accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(SubmitResponse { process_id })),
    ))
}

/// GET /api/v1/dialcodes/images/{process_id}
///
/// Report batch progress. Completed batches include the archive URL.
pub async fn get_status(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let batch = BatchRepo::find_by_process_id(&state.pool, &process_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Batch",
            id: process_id,
        }))?;

    let body = if batch.status_id == BatchStatus::Completed.id() {
        BatchStatusResponse {
            status: "completed",
            url: batch.archive_url,
        }
    } else {
        BatchStatusResponse {
            status: "in-process",
            url: None,
        }
    };

    Ok(Json(DataResponse::new(body)))
}
