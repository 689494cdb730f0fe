//! Redelivery of queued submissions.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::cache::LocalCache;
use crate::collector::SubmissionMirror;
use crate::error::Result;

/// Outcome of one pass over the outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Deliver queued submissions oldest first, stopping at the first failure.
///
/// Each attempt is bounded by `request_timeout`. Records behind a failed one
/// stay queued in the same order. Records whose id is already being delivered
/// elsewhere are skipped and counted as remaining.
pub async fn sync_pending(
    cache: &LocalCache,
    mirror: &dyn SubmissionMirror,
    request_timeout: Duration,
) -> Result<SyncReport> {
    let pending = cache.pending().await?;
    let total = pending.len();
    let mut report = SyncReport {
        delivered: 0,
        remaining: total,
    };

    for submission in pending {
        let claim = match submission.id.as_ref() {
            Some(id) => match cache.claim(id) {
                Some(claim) => Some(claim),
                None => {
                    tracing::debug!(id = %id, "Delivery already in flight, skipping");
                    continue;
                }
            },
            None => None,
        };

        let attempt = tokio::time::timeout(request_timeout, mirror.deliver(&submission)).await;
        match attempt {
            Ok(Ok(())) => {
                if let Some(claim) = claim.as_ref() {
                    cache.mark_delivered(claim.id()).await?;
                }
                report.delivered += 1;
                report.remaining -= 1;
            }
            Ok(Err(error)) => {
                tracing::info!(id = %submission.id_label(), %error, "Outbox delivery failed");
                break;
            }
            Err(_) => {
                tracing::info!(
                    id = %submission.id_label(),
                    timeout_ms = request_timeout.as_millis(),
                    "Outbox delivery timed out"
                );
                break;
            }
        }
    }

    if total > 0 {
        tracing::debug!(
            delivered = report.delivered,
            remaining = report.remaining,
            "Outbox sync pass finished"
        );
    }
    Ok(report)
}

/// Background worker that runs [`sync_pending`] on a fixed interval.
pub struct OutboxSync {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl OutboxSync {
    pub fn spawn(
        cache: Arc<LocalCache>,
        mirror: Arc<dyn SubmissionMirror>,
        interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "Outbox sync started");
            loop {
                tokio::select! {
                    () = tokio::time::sleep(interval) => {
                        if let Err(error) = sync_pending(&cache, mirror.as_ref(), request_timeout).await {
                            tracing::error!(%error, "Outbox sync pass failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Outbox sync shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signal the worker and wait for the current pass to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(error) = self.handle.await {
            tracing::warn!(%error, "Outbox sync task ended abnormally");
        }
    }
}
