//! Static files below the asset root.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use sideload_core::error::{AppError, AssetError};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /assets/{*path}
pub async fn serve_asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    // Escapes answer 404 like any miss; only the log tells them apart.
    let asset = state.assets.open(&path).await.map_err(|e| {
        match &e {
            AssetError::PathTraversalRejected(_) => {
                tracing::warn!(path = %path, "Asset path escapes the root")
            }
            _ => tracing::debug!(path = %path, error = %e, "Asset request refused"),
        }
        e
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, asset.content_type)
        .header(header::CONTENT_LENGTH, asset.len)
        .body(Body::from_stream(ReaderStream::new(asset.file)))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")).into())
}
