//! postbox-core - Core library for postbox
//!
//! This crate contains the contact submission model, the JSON list store used
//! by the collector, the collector HTTP client, and the local-first submission
//! client shared by every postbox interface.

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use models::{ContactForm, ContactSubmission, SubmissionId};
