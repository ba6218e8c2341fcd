//! State shared by every handler of one running server.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use sideload_core::config::AppConfig;
use sideload_core::result::AppResult;
use sideload_core::traits::Notifier;
use sideload_storage::{ArtifactStore, AssetStore};

/// Application state passed to every Axum handler via `State<AppState>`.
///
/// Built fresh on each `start`, so the notifier and the upload lock never
/// outlive the run they belong to.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Fixed-destination artifact store
    pub artifacts: Arc<ArtifactStore>,
    /// Landing page and static tree
    pub assets: Arc<AssetStore>,
    /// Host callback for finished artifacts
    pub notifier: Notifier,
    /// Serializes writers of the fixed destination
    pub upload_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Prepare the stores for `config` and bind the host notifier.
    pub async fn new(config: Arc<AppConfig>, notifier: Notifier) -> AppResult<Self> {
        let artifacts = ArtifactStore::new(&config.upload).await?;
        let assets = AssetStore::new(&config.assets);

        Ok(Self {
            config,
            artifacts: Arc::new(artifacts),
            assets: Arc::new(assets),
            notifier,
            upload_lock: Arc::new(Mutex::new(())),
        })
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("artifacts", &self.artifacts)
            .field("assets", &self.assets)
            .finish_non_exhaustive()
    }
}
