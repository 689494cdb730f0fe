//! Persistence for contact submissions.
//!
//! Both the collector's on-disk list and the client's local cache are plain
//! JSON arrays rewritten in full on every change. [`JsonListFile`] owns the
//! read-modify-write cycle; [`SubmissionStore`] is the seam the collector's
//! handlers are written against.

mod json_file;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ContactSubmission;

pub use json_file::{JsonFileStore, JsonListFile};

/// File name used for persisted submission lists.
pub const DEFAULT_STORE_FILE: &str = "contact-messages.json";

/// Append-only storage for contact submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Append one record to the end of the list.
    async fn append(&self, submission: ContactSubmission) -> Result<()>;

    /// Return the full list in insertion order (empty when nothing was stored yet).
    async fn list(&self) -> Result<Vec<ContactSubmission>>;
}
