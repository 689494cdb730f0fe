//! Contact form controller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::cache::LocalCache;
use super::status::{StatusTracker, SubmitStatus};
use crate::collector::SubmissionMirror;
use crate::error::Result;
use crate::models::{ContactForm, ContactSubmission};

/// What happened to the delivery attempt of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The collector acknowledged the record.
    Acknowledged,
    /// The collector failed, timed out, or was unreachable; the record stays
    /// in the outbox.
    Queued { reason: String },
}

/// Result of a submit that met the local durability bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub submission: ContactSubmission,
    pub delivery: Delivery,
}

/// Drives one contact form through `idle → submitting → success/error → idle`.
pub struct FormController {
    form: ContactForm,
    cache: Arc<LocalCache>,
    mirror: Arc<dyn SubmissionMirror>,
    status: StatusTracker,
    request_timeout: Duration,
}

impl FormController {
    pub fn new(
        cache: Arc<LocalCache>,
        mirror: Arc<dyn SubmissionMirror>,
        request_timeout: Duration,
        reset_delay: Duration,
    ) -> Self {
        Self {
            form: ContactForm::default(),
            cache,
            mirror,
            status: StatusTracker::new(reset_delay),
            request_timeout,
        }
    }

    pub const fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn set_form(&mut self, form: ContactForm) {
        self.form = form;
    }

    pub const fn status(&self) -> &StatusTracker {
        &self.status
    }

    /// Submit the current form.
    ///
    /// Only a failure to persist locally is returned as an error (status
    /// `error`, form kept). Any delivery failure is logged, the record stays
    /// queued, and the submit still succeeds (status `success`, form cleared).
    pub async fn submit(&mut self) -> Result<SubmitReceipt> {
        self.status.begin();
        let submission = self.form.to_submission(Utc::now());

        // Claimed before the outbox write so a background sync pass skips it.
        let cache = Arc::clone(&self.cache);
        let claim = submission.id.as_ref().and_then(|id| cache.claim(id));

        if let Err(error) = cache.record(&submission).await {
            tracing::error!(id = %submission.id_label(), %error, "Failed to persist submission locally");
            self.status.settle(SubmitStatus::Error);
            return Err(error);
        }

        let delivery = if claim.is_some() {
            self.deliver_once(&submission).await
        } else {
            Delivery::Queued {
                reason: "another delivery of this id is in progress".to_string(),
            }
        };
        drop(claim);

        self.form.clear();
        self.status.settle(SubmitStatus::Success);
        Ok(SubmitReceipt {
            submission,
            delivery,
        })
    }

    async fn deliver_once(&self, submission: &ContactSubmission) -> Delivery {
        let attempt = tokio::time::timeout(self.request_timeout, self.mirror.deliver(submission));
        let reason = match attempt.await {
            Ok(Ok(())) => {
                if let Some(id) = submission.id.as_ref() {
                    if let Err(error) = self.cache.mark_delivered(id).await {
                        tracing::warn!(id = %id, %error, "Delivered submission could not be removed from the outbox");
                    }
                }
                tracing::info!(id = %submission.id_label(), "Submission delivered to collector");
                return Delivery::Acknowledged;
            }
            Ok(Err(error)) => error.to_string(),
            Err(_) => format!(
                "collector did not answer within {} ms",
                self.request_timeout.as_millis()
            ),
        };

        tracing::info!(
            id = %submission.id_label(),
            reason = %reason,
            "Collector not available, submission kept in outbox"
        );
        Delivery::Queued { reason }
    }
}
