//! Contact submission model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::util::iso_timestamp;

/// Client-generated submission identifier.
///
/// Derived from the submission time as Unix milliseconds. Records written by
/// other clients may carry any JSON value here, so the raw value is kept.
/// Uniqueness is expected but never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Value);

impl SubmissionId {
    /// Build an identifier from a submission instant.
    #[must_use]
    pub fn from_time(at: DateTime<Utc>) -> Self {
        Self(Value::String(at.timestamp_millis().to_string()))
    }

    /// The identifier when it is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            other => write!(f, "{other}"),
        }
    }
}

impl From<String> for SubmissionId {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<&str> for SubmissionId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Value> for SubmissionId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A contact message as persisted by the collector and the local cache.
///
/// The collector stores whatever object it was sent, so the known fields hold
/// raw JSON values and every other key lands in `extra`. A field sent as
/// `null` stays `null`; an absent field stays absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<SubmissionId>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    /// Submission time as observed by the client (ISO-8601)
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    /// Time the collector processed the request (ISO-8601)
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub received_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A key that is present maps to `Some`, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn text(field: Option<&Value>) -> Option<&str> {
    field.and_then(Value::as_str)
}

impl ContactSubmission {
    /// Stamp the record with the collector's receive time.
    ///
    /// Any `receivedAt` sent by the caller is replaced.
    #[must_use]
    pub fn received(self, at: DateTime<Utc>) -> Self {
        Self {
            received_at: Some(Value::String(iso_timestamp(at))),
            ..self
        }
    }

    pub fn name(&self) -> Option<&str> {
        text(self.name.as_ref())
    }

    pub fn email(&self) -> Option<&str> {
        text(self.email.as_ref())
    }

    pub fn subject(&self) -> Option<&str> {
        text(self.subject.as_ref())
    }

    pub fn message(&self) -> Option<&str> {
        text(self.message.as_ref())
    }

    pub fn timestamp(&self) -> Option<&str> {
        text(self.timestamp.as_ref())
    }

    pub fn received_at(&self) -> Option<&str> {
        text(self.received_at.as_ref())
    }

    /// Short label for log lines and listings.
    #[must_use]
    pub fn id_label(&self) -> String {
        self.id
            .as_ref()
            .map_or_else(|| "<none>".to_string(), ToString::to_string)
    }
}

/// The contact form fields as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Build the record for a submission made at `at`.
    #[must_use]
    pub fn to_submission(&self, at: DateTime<Utc>) -> ContactSubmission {
        ContactSubmission {
            id: Some(SubmissionId::from_time(at)),
            name: Some(Value::from(self.name.as_str())),
            email: Some(Value::from(self.email.as_str())),
            subject: Some(Value::from(self.subject.as_str())),
            message: Some(Value::from(self.message.as_str())),
            timestamp: Some(Value::from(iso_timestamp(at))),
            received_at: None,
            extra: Map::new(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.subject.is_empty()
            && self.message.is_empty()
    }
}
