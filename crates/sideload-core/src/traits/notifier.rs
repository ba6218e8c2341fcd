//! Artifact-ready callback supplied by the host at start time.

use std::path::Path;
use std::sync::Arc;

/// Invoked once per successful upload with the artifact location.
///
/// Runs on the request-handling task, so it must return promptly; hosts
/// that do slow work should hand the path off to their own task. After the
/// call the artifact belongs to the host.
pub type Notifier = Arc<dyn Fn(&Path) + Send + Sync + 'static>;

/// Wrap a closure as a [`Notifier`].
pub fn notifier<F>(f: F) -> Notifier
where
    F: Fn(&Path) + Send + Sync + 'static,
{
    Arc::new(f)
}
