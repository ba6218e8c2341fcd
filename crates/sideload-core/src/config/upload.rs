//! Upload destination configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the received artifact lands and how large it may be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory holding the artifact and in-flight partial files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Fixed artifact filename. Client-supplied names are never used.
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
    /// Maximum request body size in bytes (default 200 MiB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl UploadConfig {
    /// Full path of the artifact destination.
    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.artifact_name)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            artifact_name: default_artifact_name(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_artifact_name() -> String {
    "temp.apk".to_string()
}

fn default_max_upload() -> u64 {
    200 * 1024 * 1024
}
