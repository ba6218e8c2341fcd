//! Sleep lock through `systemd-inhibit`.
//!
//! The lock lives as long as a child `systemd-inhibit ... sleep <secs>`
//! process. When the inner `sleep` ends the lock lapses on its own, which
//! gives the bounded hold duration for free.

use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use sideload_core::error::ResourceHoldError;
use sideload_core::traits::ResourceHold;

const INHIBIT_PROGRAM: &str = "systemd-inhibit";

/// Holds a logind `sleep:idle` block lock while acquired.
#[derive(Debug)]
pub struct InhibitResourceHold {
    program: String,
    child: Mutex<Option<Child>>,
}

impl Default for InhibitResourceHold {
    fn default() -> Self {
        Self::new()
    }
}

impl InhibitResourceHold {
    /// Use `systemd-inhibit` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(INHIBIT_PROGRAM)
    }

    /// Use a specific inhibit binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: Mutex::new(None),
        }
    }

    fn child(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn running(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

#[async_trait]
impl ResourceHold for InhibitResourceHold {
    fn name(&self) -> &str {
        "systemd-inhibit"
    }

    async fn acquire(&self, max_duration: Duration) -> Result<(), ResourceHoldError> {
        let mut slot = self.child();
        if slot.as_mut().is_some_and(running) {
            return Err(ResourceHoldError::AlreadyHeld);
        }

        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--what=sleep:idle",
            "--who=sideload",
            "--why=Receiving uploads",
            "--mode=block",
            "sleep",
        ])
        .arg(max_duration.as_secs().max(1).to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ResourceHoldError::AcquisitionDenied(format!("cannot run {}: {e}", self.program))
        })?;

        if let Ok(Some(status)) = child.try_wait() {
            return Err(ResourceHoldError::AcquisitionDenied(format!(
                "{} exited immediately with {status}",
                self.program
            )));
        }

        tracing::debug!(pid = ?child.id(), "Sleep inhibitor started");
        *slot = Some(child);
        Ok(())
    }

    async fn release(&self) {
        let child = self.child().take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to stop sleep inhibitor: {}", e);
            } else {
                tracing::debug!("Sleep inhibitor stopped");
            }
        }
    }

    fn is_held(&self) -> bool {
        self.child().as_mut().is_some_and(running)
    }
}
