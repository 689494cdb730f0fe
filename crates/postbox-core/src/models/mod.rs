//! Data models for postbox

mod envelope;
mod submission;

pub use envelope::{FailureResponse, ListResponse, SubmitResponse};
pub use submission::{ContactForm, ContactSubmission, SubmissionId};
