//! Local-first submission client.
//!
//! A submit persists the record into the [`LocalCache`] first and only then
//! makes one bounded delivery attempt to the collector. The local write is the
//! success criterion; undelivered records wait in the outbox until
//! [`sync_pending`] or an [`OutboxSync`] worker gets them acknowledged.

mod cache;
mod controller;
mod outbox;
mod status;

pub use cache::{CacheEntry, DeliveryClaim, LocalCache, OUTBOX_FILE};
pub use controller::{Delivery, FormController, SubmitReceipt};
pub use outbox::{sync_pending, OutboxSync, SyncReport};
pub use status::{StatusTracker, SubmitStatus};
