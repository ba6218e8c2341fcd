//! Route definitions for the sideload HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | landing page |
//! | `GET /assets/{*path}` | static tree, root-confined |
//! | `POST /upload` | streaming multipart upload, size-capped |

use std::any::Any;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The upload route swaps Axum's default body limit for a
/// `RequestBodyLimitLayer`, which refuses an oversized `Content-Length`
/// before the body is read and cuts off unsized bodies once they cross the
/// limit.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.upload.max_upload_size_bytes).unwrap_or(usize::MAX);

    let upload_routes = Router::new()
        .route("/upload", post(handlers::upload::upload))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload));

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/assets/{*path}", get(handlers::assets::serve_asset))
        .merge(upload_routes)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Turns a handler panic into a 500 so the listener keeps serving.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.").into_response()
}
