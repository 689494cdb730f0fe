//! Submit status with timed auto-reset.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

/// Form controller status.
///
/// `Idle → Submitting → {Success, Error} → Idle`, where the last step happens
/// on its own after the configured reset delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Publishes status changes and schedules the reset back to `Idle`.
///
/// Each transition bumps a generation counter; a reset timer only fires if no
/// newer transition happened while it slept.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    sender: Arc<watch::Sender<SubmitStatus>>,
    generation: Arc<AtomicU64>,
    reset_delay: Duration,
}

impl StatusTracker {
    pub fn new(reset_delay: Duration) -> Self {
        let (sender, _) = watch::channel(SubmitStatus::Idle);
        Self {
            sender: Arc::new(sender),
            generation: Arc::new(AtomicU64::new(0)),
            reset_delay,
        }
    }

    pub fn current(&self) -> SubmitStatus {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmitStatus> {
        self.sender.subscribe()
    }

    pub fn begin(&self) {
        self.transition(SubmitStatus::Submitting);
    }

    /// Move to a terminal status and schedule the automatic reset.
    ///
    /// Must be called from within a tokio runtime.
    pub fn settle(&self, status: SubmitStatus) {
        debug_assert!(status.is_settled());
        let generation = self.transition(status);

        let sender = Arc::clone(&self.sender);
        let current_generation = Arc::clone(&self.generation);
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current_generation.load(Ordering::SeqCst) == generation {
                sender.send_replace(SubmitStatus::Idle);
                tracing::debug!(from = %status, "Submit status reset to idle");
            }
        });
    }

    fn transition(&self, status: SubmitStatus) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sender.send_replace(status);
        generation
    }
}
