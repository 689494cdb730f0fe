//! On-disk client cache: every submission ever made, plus the outbox.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::error::Result;
use crate::models::{ContactSubmission, SubmissionId};
use crate::store::{JsonListFile, DEFAULT_STORE_FILE};

/// File holding submissions that the collector has not acknowledged yet.
pub const OUTBOX_FILE: &str = "outbox.json";

/// A cached submission together with its delivery state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub submission: ContactSubmission,
    pub delivered: bool,
}

/// Client-owned persistence.
///
/// `contact-messages.json` is the append-only history in the same shape the
/// collector stores. `outbox.json` is the write-ahead queue of records still
/// waiting for delivery. The two are never reconciled with the collector's
/// list.
///
/// Ids currently being delivered are tracked in memory so a submit and a
/// background sync sharing one cache never send the same record twice.
#[derive(Debug)]
pub struct LocalCache {
    dir: PathBuf,
    history: JsonListFile<ContactSubmission>,
    outbox: JsonListFile<ContactSubmission>,
    in_flight: Mutex<Vec<SubmissionId>>,
}

/// Exclusive right to deliver one submission id; released on drop.
#[derive(Debug)]
pub struct DeliveryClaim<'a> {
    cache: &'a LocalCache,
    id: SubmissionId,
}

impl DeliveryClaim<'_> {
    pub const fn id(&self) -> &SubmissionId {
        &self.id
    }
}

impl Drop for DeliveryClaim<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .cache
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = in_flight.iter().position(|id| id == &self.id) {
            in_flight.swap_remove(index);
        }
    }
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            history: JsonListFile::new(dir.join(DEFAULT_STORE_FILE)),
            outbox: JsonListFile::new(dir.join(OUTBOX_FILE)),
            in_flight: Mutex::new(Vec::new()),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Queue a new submission for delivery and add it to the history.
    ///
    /// The outbox is written first. When the history write then fails, the
    /// queued copy is taken back out, so a failed record leaves no trace.
    pub async fn record(&self, submission: &ContactSubmission) -> Result<()> {
        let queued = submission.clone();
        self.outbox.update(move |items| items.push(queued)).await?;

        let cached = submission.clone();
        if let Err(error) = self.history.update(move |items| items.push(cached)).await {
            let stale = submission.clone();
            let rollback = self
                .outbox
                .update(move |items| {
                    if let Some(index) = items.iter().rposition(|item| item == &stale) {
                        items.remove(index);
                    }
                })
                .await;
            if let Err(rollback_error) = rollback {
                tracing::error!(
                    id = %submission.id_label(),
                    error = %rollback_error,
                    "Failed to withdraw queued submission after history write failed"
                );
            }
            return Err(error);
        }
        Ok(())
    }

    /// Reserve `id` for delivery.
    ///
    /// Returns `None` while another delivery of the same id is in flight.
    pub fn claim(&self, id: &SubmissionId) -> Option<DeliveryClaim<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if in_flight.contains(id) {
            return None;
        }
        in_flight.push(id.clone());
        Some(DeliveryClaim {
            cache: self,
            id: id.clone(),
        })
    }

    /// Drop the first queued record carrying `id`.
    ///
    /// Returns whether anything was removed.
    pub async fn mark_delivered(&self, id: &SubmissionId) -> Result<bool> {
        let id = id.clone();
        self.outbox
            .update(move |items| {
                items
                    .iter()
                    .position(|item| item.id.as_ref() == Some(&id))
                    .map(|index| items.remove(index))
                    .is_some()
            })
            .await
    }

    pub async fn history(&self) -> Result<Vec<ContactSubmission>> {
        self.history.load().await
    }

    /// Records still waiting for delivery, oldest first.
    pub async fn pending(&self) -> Result<Vec<ContactSubmission>> {
        self.outbox.load().await
    }

    /// History annotated with delivery state.
    ///
    /// When several records share an id, the newest ones are the ones
    /// reported as pending.
    pub async fn entries(&self) -> Result<Vec<CacheEntry>> {
        let history = self.history().await?;
        let mut pending_ids = self
            .pending()
            .await?
            .into_iter()
            .filter_map(|item| item.id)
            .collect::<Vec<_>>();

        let mut entries = history
            .into_iter()
            .rev()
            .map(|submission| {
                let queued = submission.id.as_ref().and_then(|id| {
                    pending_ids
                        .iter()
                        .position(|pending| pending == id)
                        .map(|index| pending_ids.remove(index))
                });
                CacheEntry {
                    delivered: queued.is_none(),
                    submission,
                }
            })
            .collect::<Vec<_>>();
        entries.reverse();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn submission(id: &str) -> ContactSubmission {
        ContactSubmission {
            id: Some(SubmissionId::from(id)),
            message: Some(format!("message {id}").into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn record_writes_history_and_outbox() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());

        cache.record(&submission("1")).await.unwrap();

        assert_eq!(cache.history().await.unwrap(), vec![submission("1")]);
        assert_eq!(cache.pending().await.unwrap(), vec![submission("1")]);
        assert!(dir.path().join(DEFAULT_STORE_FILE).exists());
        assert!(dir.path().join(OUTBOX_FILE).exists());
    }

    #[tokio::test]
    async fn mark_delivered_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.record(&submission("1")).await.unwrap();
        cache.record(&submission("2")).await.unwrap();

        assert!(cache.mark_delivered(&SubmissionId::from("1")).await.unwrap());
        assert!(!cache.mark_delivered(&SubmissionId::from("9")).await.unwrap());

        assert_eq!(cache.history().await.unwrap().len(), 2);
        assert_eq!(cache.pending().await.unwrap(), vec![submission("2")]);
    }

    #[tokio::test]
    async fn entries_report_delivery_state() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.record(&submission("1")).await.unwrap();
        cache.record(&submission("2")).await.unwrap();
        cache.mark_delivered(&SubmissionId::from("1")).await.unwrap();

        let states = cache
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| (entry.submission.id_label(), entry.delivered))
            .collect::<Vec<_>>();
        assert_eq!(
            states,
            vec![("1".to_string(), true), ("2".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn unwritable_directory_fails_record() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let cache = LocalCache::new(&blocker);
        assert!(cache.record(&submission("1")).await.is_err());
    }

    #[tokio::test]
    async fn failed_outbox_write_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        std::fs::create_dir(dir.path().join("outbox.json.tmp")).unwrap();

        assert!(cache.record(&submission("1")).await.is_err());

        assert!(cache.history().await.unwrap().is_empty());
        assert!(cache.pending().await.unwrap().is_empty());
        assert!(cache.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_history_write_withdraws_the_queued_copy() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.record(&submission("1")).await.unwrap();
        std::fs::create_dir(dir.path().join("contact-messages.json.tmp")).unwrap();

        assert!(cache.record(&submission("2")).await.is_err());

        assert_eq!(cache.history().await.unwrap(), vec![submission("1")]);
        assert_eq!(cache.pending().await.unwrap(), vec![submission("1")]);
        let states = cache
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| (entry.submission.id_label(), entry.delivered))
            .collect::<Vec<_>>();
        assert_eq!(states, vec![("1".to_string(), false)]);
    }

    #[test]
    fn claim_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        let id = SubmissionId::from("1");

        let claim = cache.claim(&id).unwrap();
        assert_eq!(claim.id(), &id);
        assert!(cache.claim(&id).is_none());
        assert!(cache.claim(&SubmissionId::from("2")).is_some());

        drop(claim);
        assert!(cache.claim(&id).is_some());
    }
}
