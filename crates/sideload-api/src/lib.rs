//! # sideload-api
//!
//! HTTP layer for sideload built on Axum.
//!
//! Serves the landing page and static assets, streams `POST /upload`
//! bodies to the artifact store, and owns the listener lifecycle through
//! [`UploadServer`].

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::UploadServer;
pub use state::AppState;
