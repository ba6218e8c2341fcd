//! Host-side artifact hook.

use serde::{Deserialize, Serialize};

/// Command the server binary runs for every received artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    /// Program and arguments; the artifact path is appended as the last
    /// argument. `None` only logs the artifact.
    #[serde(default)]
    pub command: Option<String>,
}
