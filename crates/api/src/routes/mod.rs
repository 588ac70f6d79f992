pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /dialcodes/generate            reserve dialcodes (POST)
/// /dialcodes/images              submit an image batch (POST)
/// /dialcodes/images/{process_id} batch status / archive URL (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dialcodes/generate", post(handlers::dialcodes::generate))
        .route("/dialcodes/images", post(handlers::batches::submit))
        .route(
            "/dialcodes/images/{process_id}",
            get(handlers::batches::get_status),
        )
}
