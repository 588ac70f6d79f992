//! Handler for reserving dialcodes from the upstream allocation service.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::allocator::{generate_dialcodes, AllocationRequest};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateDialcodes {
    #[validate(range(min = 1, message = "count must be at least 1"))]
    pub count: u32,
    #[validate(length(min = 1, message = "publisher must not be empty"))]
    pub publisher: String,
    pub batch_code: Option<String>,
}

/// POST /api/v1/dialcodes/generate
///
/// Reserve `count` codes, splitting the request into upstream-sized calls.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateDialcodes>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let request = AllocationRequest {
        count: input.count,
        publisher: input.publisher,
        batch_code: input.batch_code,
    };

    let result = generate_dialcodes(
        state.allocator.as_ref(),
        &request,
        state.config.allocator_per_call_max,
        state.config.shortfall_policy,
    )
    .await?;

    tracing::info!(
        requested = request.count,
        received = result.count,
        publisher = %request.publisher,
        "Dialcodes reserved"
    );

    Ok(Json(DataResponse::new(result)))
}
