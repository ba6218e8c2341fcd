//! Static asset locations.

use serde::{Deserialize, Serialize};

/// Landing page and static directory served by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Document returned for `GET /`.
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Directory tree served under `/assets/`.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            index_file: default_index_file(),
            root_dir: default_root_dir(),
        }
    }
}

fn default_index_file() -> String {
    "web/index.html".to_string()
}

fn default_root_dir() -> String {
    "web/assets".to_string()
}
