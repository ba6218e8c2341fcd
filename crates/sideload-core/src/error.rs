//! Unified application error types for sideload.
//!
//! The lifecycle, upload, asset and resource-hold paths each have their own
//! typed error. At the HTTP boundary they are all mapped into [`AppError`],
//! whose [`ErrorKind`] decides the response status.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A conflicting operation is already in progress.
    Conflict,
    /// The request body exceeded the configured limit.
    PayloadTooLarge,
    /// An internal server error occurred.
    Internal,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::PayloadTooLarge => write!(f, "PAYLOAD_TOO_LARGE"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// The unified application error used at the HTTP and bootstrap boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Failure to bring the upload service up.
#[derive(Debug, Error)]
pub enum StartError {
    /// `start` was called while the service was already running.
    #[error("upload service is already running")]
    AlreadyRunning,
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The upload directory could not be prepared.
    #[error("failed to prepare upload storage: {0}")]
    Prepare(#[source] AppError),
}

/// Terminal failure of a single upload request.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart body contained no file part with a filename.
    #[error("No file received.")]
    NoFileReceived,
    /// The body exceeded the configured maximum size.
    #[error("Upload exceeds the maximum size of {limit} bytes.")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: u64,
    },
    /// Writing the artifact to disk failed.
    #[error("File upload failed: {0}")]
    IoFailure(#[from] io::Error),
    /// The client went away before the file part was complete.
    #[error("File upload failed: connection lost after {received} bytes: {reason}")]
    ClientDisconnected {
        /// Bytes of the file part received before the break.
        received: u64,
        /// Transport error reported by the body stream.
        reason: String,
    },
    /// Another upload is currently being written to the destination.
    #[error("Another upload is already in progress.")]
    Busy,
    /// The request body was not a parseable multipart stream.
    #[error("Malformed multipart body: {0}")]
    MalformedBody(String),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let kind = match &err {
            UploadError::NoFileReceived | UploadError::MalformedBody(_) => ErrorKind::Validation,
            UploadError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            UploadError::Busy => ErrorKind::Conflict,
            UploadError::IoFailure(_) | UploadError::ClientDisconnected { .. } => {
                ErrorKind::Storage
            }
        };
        let message = err.to_string();
        Self::with_source(kind, message, err)
    }
}

/// Failure to serve a static asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No file exists at the requested path below the asset root.
    #[error("Asset not found: {0}")]
    NotFound(String),
    /// The requested path tried to leave the asset root.
    #[error("Rejected asset path: {0}")]
    PathTraversalRejected(String),
    /// The landing document is missing; the deployment is misconfigured.
    #[error("Landing document missing at {}", path.display())]
    AssetMissing {
        /// Configured location of the landing document.
        path: PathBuf,
        /// Underlying read error.
        #[source]
        source: io::Error,
    },
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        let kind = match &err {
            AssetError::NotFound(_) | AssetError::PathTraversalRejected(_) => ErrorKind::NotFound,
            AssetError::AssetMissing { .. } => ErrorKind::Configuration,
        };
        let message = err.to_string();
        Self::with_source(kind, message, err)
    }
}

/// Failure to take the host stay-awake resource.
#[derive(Debug, Error)]
pub enum ResourceHoldError {
    /// `acquire` was called while the hold was still in effect.
    #[error("resource hold is already held")]
    AlreadyHeld,
    /// The host refused or could not provide the hold.
    #[error("resource hold acquisition denied: {0}")]
    AcquisitionDenied(String),
}
