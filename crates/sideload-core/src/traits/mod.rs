//! Capability seams implemented by the host and by other sideload crates.

pub mod hold;
pub mod notifier;

pub use hold::ResourceHold;
pub use notifier::{Notifier, notifier};
