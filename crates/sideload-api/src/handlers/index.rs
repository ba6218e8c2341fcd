//! Landing page.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.assets.index().await?;
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response())
}
