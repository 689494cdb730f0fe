//! HTTP client for the message collector.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{ContactSubmission, FailureResponse, ListResponse, SubmitResponse};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const CONTACT_PATH: &str = "/api/contact";

/// Destination that mirrors locally cached submissions.
#[async_trait]
pub trait SubmissionMirror: Send + Sync {
    /// Deliver one submission; `Ok` only once the remote side acknowledged it.
    async fn deliver(&self, submission: &ContactSubmission) -> Result<()>;
}

/// Client for `POST`/`GET /api/contact`.
///
/// Every request is bounded by the timeout given at construction; an elapsed
/// timeout aborts the in-flight request and surfaces as [`Error::Http`].
#[derive(Debug, Clone)]
pub struct CollectorClient {
    base_url: String,
    client: reqwest::Client,
}

impl CollectorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.collector_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn contact_endpoint(&self) -> String {
        format!("{}{CONTACT_PATH}", self.base_url)
    }

    /// Post one submission.
    ///
    /// Any 2xx status counts as an acknowledgement. The body is decoded when it
    /// is a submit envelope and ignored otherwise.
    pub async fn submit(&self, submission: &ContactSubmission) -> Result<Option<SubmitResponse>> {
        let response = self
            .client
            .post(self.contact_endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Collector(parse_api_error(status, &body)));
        }

        let body = response.text().await.unwrap_or_default();
        let ack = serde_json::from_str::<SubmitResponse>(&body).ok();
        if ack.is_none() {
            tracing::debug!(
                status = status.as_u16(),
                body = %compact_text(&body),
                "Collector acknowledged without a submit envelope"
            );
        }
        Ok(ack)
    }

    pub async fn list(&self) -> Result<Vec<ContactSubmission>> {
        let response = self
            .client
            .get(self.contact_endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Collector(parse_api_error(status, &body)));
        }

        let payload = response.json::<ListResponse>().await?;
        Ok(payload.messages)
    }
}

#[async_trait]
impl SubmissionMirror for CollectorClient {
    async fn deliver(&self, submission: &ContactSubmission) -> Result<()> {
        self.submit(submission).await.map(|_| ())
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<FailureResponse>(body) {
        return format!("{} ({})", payload.message.trim(), status.as_u16());
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("collector URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "collector URL must include http:// or https://".to_string(),
        ))
    }
}
