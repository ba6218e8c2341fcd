//! Read-only access to the landing page and the static asset tree.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::warn;

use sideload_core::config::AssetsConfig;
use sideload_core::error::AssetError;

/// Landing document plus a directory tree served below a fixed root.
#[derive(Debug, Clone)]
pub struct AssetStore {
    index_file: PathBuf,
    root: PathBuf,
}

/// An opened static file ready to be streamed.
#[derive(Debug)]
pub struct StaticAsset {
    /// Canonical path of the file.
    pub path: PathBuf,
    /// Open handle.
    pub file: fs::File,
    /// File size in bytes.
    pub len: u64,
    /// Content type guessed from the extension.
    pub content_type: String,
}

impl AssetStore {
    /// Create a store from configuration. Nothing is touched on disk yet.
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            index_file: PathBuf::from(&config.index_file),
            root: PathBuf::from(&config.root_dir),
        }
    }

    /// Read the landing document.
    pub async fn index(&self) -> Result<Bytes, AssetError> {
        fs::read(&self.index_file)
            .await
            .map(Bytes::from)
            .map_err(|source| AssetError::AssetMissing {
                path: self.index_file.clone(),
                source,
            })
    }

    /// Open `request_path` (relative to the asset root).
    ///
    /// Parent references, absolute paths and anything that resolves outside
    /// the canonical root are rejected, including through symlinks.
    pub async fn open(&self, request_path: &str) -> Result<StaticAsset, AssetError> {
        let relative = sanitize(request_path)?;

        let root = fs::canonicalize(&self.root).await.map_err(|e| {
            warn!(root = %self.root.display(), error = %e, "Asset root is not accessible");
            AssetError::NotFound(request_path.to_string())
        })?;

        let candidate = fs::canonicalize(root.join(&relative))
            .await
            .map_err(|_| AssetError::NotFound(request_path.to_string()))?;

        if !candidate.starts_with(&root) {
            return Err(AssetError::PathTraversalRejected(request_path.to_string()));
        }

        let meta = fs::metadata(&candidate)
            .await
            .map_err(|_| AssetError::NotFound(request_path.to_string()))?;
        if !meta.is_file() {
            return Err(AssetError::NotFound(request_path.to_string()));
        }

        let file = fs::File::open(&candidate)
            .await
            .map_err(|_| AssetError::NotFound(request_path.to_string()))?;

        let content_type = mime_guess::from_path(&candidate)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(StaticAsset {
            path: candidate,
            file,
            len: meta.len(),
            content_type,
        })
    }
}

/// Turn a URL path tail into a relative filesystem path made only of
/// normal components.
fn sanitize(request_path: &str) -> Result<PathBuf, AssetError> {
    let reject = || AssetError::PathTraversalRejected(request_path.to_string());

    let mut relative = PathBuf::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(reject()),
            s if s.contains(&['\\', '\0', ':'][..]) => return Err(reject()),
            s => {
                let mut components = Path::new(s).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => relative.push(s),
                    _ => return Err(reject()),
                }
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(AssetError::NotFound(request_path.to_string()));
    }
    Ok(relative)
}
