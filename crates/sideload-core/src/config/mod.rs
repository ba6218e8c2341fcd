//! Configuration schema for sideload.
//!
//! Sources are layered with the `config` crate: a base TOML file, an
//! optional environment overlay next to it, then `SIDELOAD__*` environment
//! variables. Every field has a default, so a missing file is not an error.

pub mod assets;
pub mod hook;
pub mod logging;
pub mod power;
pub mod server;
pub mod upload;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::assets::AssetsConfig;
pub use self::hook::HookConfig;
pub use self::logging::LoggingConfig;
pub use self::power::{PowerConfig, PowerProvider};
pub use self::server::ServerConfig;
pub use self::upload::UploadConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload destination and limits.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Landing page and static asset locations.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Stay-awake resource settings.
    #[serde(default)]
    pub power: PowerConfig,
    /// Host-side artifact hook.
    #[serde(default)]
    pub hook: HookConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `path`, an `{env}` overlay in the same
    /// directory, and `SIDELOAD__SECTION__KEY` environment variables.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let overlay = Path::new(path)
            .with_file_name(format!("{env}.toml"))
            .to_string_lossy()
            .into_owned();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&overlay).required(false))
            .add_source(
                config::Environment::with_prefix("SIDELOAD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
