//! Host stay-awake capability.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ResourceHoldError;

/// Keeps the host from suspending while the upload service is active.
///
/// Implementations must refuse a second `acquire` while a hold is still in
/// effect. A hold that has outlived its `max_duration` counts as expired:
/// `is_held` reports `false` and a new `acquire` is allowed.
#[async_trait]
pub trait ResourceHold: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Take the hold for at most `max_duration`.
    async fn acquire(&self, max_duration: Duration) -> Result<(), ResourceHoldError>;

    /// Release the hold if held. No-op otherwise.
    async fn release(&self);

    /// Whether a hold is currently in effect.
    fn is_held(&self) -> bool;
}
