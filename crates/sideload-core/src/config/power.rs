//! Stay-awake resource configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which host mechanism keeps the machine awake while serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerProvider {
    /// No sleep management.
    #[default]
    Noop,
    /// `systemd-inhibit` sleep lock.
    Inhibit,
}

/// Resource hold settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Hold implementation.
    #[serde(default)]
    pub provider: PowerProvider,
    /// Safety ceiling for a single hold, in seconds. The server keeps
    /// running past it and renews the hold.
    #[serde(default = "default_max_hold")]
    pub max_hold_seconds: u64,
}

impl PowerConfig {
    /// Maximum duration of a single hold.
    pub fn max_hold(&self) -> Duration {
        Duration::from_secs(self.max_hold_seconds.max(1))
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            provider: PowerProvider::default(),
            max_hold_seconds: default_max_hold(),
        }
    }
}

fn default_max_hold() -> u64 {
    10 * 60
}
