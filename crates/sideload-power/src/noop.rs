//! Hold for hosts without sleep management.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use sideload_core::error::ResourceHoldError;
use sideload_core::traits::ResourceHold;

/// Tracks hold state and expiry without touching the host.
#[derive(Debug, Default)]
pub struct NoopResourceHold {
    deadline: Mutex<Option<Instant>>,
}

impl NoopResourceHold {
    /// Create a released hold.
    pub fn new() -> Self {
        Self::default()
    }

    fn deadline(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.deadline.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ResourceHold for NoopResourceHold {
    fn name(&self) -> &str {
        "noop"
    }

    async fn acquire(&self, max_duration: Duration) -> Result<(), ResourceHoldError> {
        let mut deadline = self.deadline();
        if deadline.is_some_and(|d| Instant::now() < d) {
            return Err(ResourceHoldError::AlreadyHeld);
        }
        *deadline = Some(Instant::now() + max_duration);
        Ok(())
    }

    async fn release(&self) {
        self.deadline().take();
    }

    fn is_held(&self) -> bool {
        self.deadline().is_some_and(|d| Instant::now() < d)
    }
}
