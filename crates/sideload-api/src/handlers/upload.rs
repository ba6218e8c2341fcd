//! Streaming artifact upload.
//!
//! The first multipart part that carries a non-empty filename is streamed
//! straight into the artifact store; everything else is skipped without
//! buffering. The client-supplied filename is only logged.

use axum::extract::State;
use axum::extract::multipart::{Field, Multipart, MultipartError, MultipartRejection};
use axum::http::StatusCode;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sideload_core::error::UploadError;
use sideload_storage::{ArtifactReceipt, CopyError};

use crate::error::ApiError;
use crate::state::AppState;

/// Body returned for a successful upload.
pub const UPLOAD_OK: &str = "File uploaded successfully.";

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let upload_id = Uuid::new_v4();
    let limit = state.config.upload.max_upload_size_bytes;
    let mut multipart = multipart.map_err(|e| UploadError::MalformedBody(e.body_text()))?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(classify_stream_error(e, limit, None).into()),
        };

        let Some(original_name) = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
        else {
            debug!(%upload_id, part = ?field.name(), "Skipping non-file part");
            continue;
        };

        let _writer_slot = state.upload_lock.try_lock().map_err(|_| {
            warn!(%upload_id, "Rejecting upload while another is in flight");
            UploadError::Busy
        })?;

        info!(%upload_id, original_name = %original_name, "Receiving artifact");
        let receipt = receive(&state, field, limit).await.map_err(|e| {
            warn!(%upload_id, error = %e, "Upload aborted");
            e
        })?;

        info!(
            %upload_id,
            path = %receipt.path.display(),
            bytes = receipt.bytes,
            "Artifact stored, notifying host"
        );
        (state.notifier)(&receipt.path);

        drain(&mut multipart, upload_id).await;
        return Ok((StatusCode::OK, UPLOAD_OK));
    }

    info!(%upload_id, "Multipart body had no file part");
    Err(UploadError::NoFileReceived.into())
}

/// Stream one file part into a partial artifact and commit it.
async fn receive(
    state: &AppState,
    field: Field<'_>,
    limit: u64,
) -> Result<ArtifactReceipt, UploadError> {
    let mut writer = state.artifacts.begin().await?;

    match writer.copy_stream(field).await {
        Ok(_) => {}
        Err(CopyError::Read(e)) => {
            let received = writer.bytes_written();
            writer.discard().await;
            return Err(classify_stream_error(e, limit, Some(received)));
        }
        Err(CopyError::Write(e)) => {
            writer.discard().await;
            return Err(UploadError::IoFailure(e));
        }
    }

    Ok(writer.commit().await?)
}

/// Dispose of whatever follows the accepted file part.
async fn drain(multipart: &mut Multipart, upload_id: Uuid) {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => debug!(%upload_id, part = ?field.name(), "Ignoring extra part"),
            Ok(None) => break,
            Err(e) => {
                debug!(%upload_id, error = %e, "Stopped draining trailing parts");
                break;
            }
        }
    }
}

/// `received` is `Some` once a file part was being copied.
fn classify_stream_error(err: MultipartError, limit: u64, received: Option<u64>) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return UploadError::PayloadTooLarge { limit };
    }
    match received {
        Some(received) => UploadError::ClientDisconnected {
            received,
            reason: err.body_text(),
        },
        None => UploadError::MalformedBody(err.body_text()),
    }
}
