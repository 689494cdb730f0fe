//! JSON envelopes exchanged between the collector and its clients.

use serde::{Deserialize, Serialize};

use super::{ContactSubmission, SubmissionId};

/// Body of a successful `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SubmissionId>,
}

/// Body of `GET /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<ContactSubmission>,
}

/// Generic failure body; carries no retry guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl SubmitResponse {
    #[must_use]
    pub fn saved(id: Option<SubmissionId>) -> Self {
        Self {
            success: true,
            message: "Message saved successfully".to_string(),
            id,
        }
    }
}

impl ListResponse {
    #[must_use]
    pub const fn new(messages: Vec<ContactSubmission>) -> Self {
        Self {
            success: true,
            messages,
        }
    }
}

impl FailureResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
