//! # sideload-power
//!
//! [`ResourceHold`] implementations. Pick one with [`from_config`].

pub mod inhibit;
pub mod noop;

use std::sync::Arc;

use sideload_core::config::{PowerConfig, PowerProvider};
use sideload_core::traits::ResourceHold;

pub use inhibit::InhibitResourceHold;
pub use noop::NoopResourceHold;

/// Build the hold selected by configuration.
pub fn from_config(config: &PowerConfig) -> Arc<dyn ResourceHold> {
    match config.provider {
        PowerProvider::Noop => Arc::new(NoopResourceHold::new()),
        PowerProvider::Inhibit => Arc::new(InhibitResourceHold::new()),
    }
}
