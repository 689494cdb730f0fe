use std::collections::HashMap;
use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use postbox_core::client::{CacheEntry, LocalCache};
use postbox_core::collector::CollectorClient;
use postbox_core::config::ClientConfig;
use postbox_core::util::normalize_text_option;
use postbox_core::ContactSubmission;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SubmissionListItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub preview: String,
    pub timestamp: Option<String>,
    pub received_at: Option<String>,
    pub relative_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<bool>,
}

/// Load client settings from the environment, letting CLI flags win.
///
/// A `--collector-url` flag goes through the same validation as
/// `POSTBOX_COLLECTOR_URL`.
pub fn resolve_config(
    collector_url: Option<String>,
    data_dir: Option<PathBuf>,
) -> Result<ClientConfig, CliError> {
    let values: HashMap<String, String> = env::vars().collect();
    resolve_config_from_lookup(collector_url, data_dir, |name| values.get(name).cloned())
}

pub fn resolve_config_from_lookup(
    collector_url: Option<String>,
    data_dir: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_lookup(|name| {
        if name == "POSTBOX_COLLECTOR_URL" {
            if let Some(url) = collector_url.as_ref() {
                return Some(url.clone());
            }
        }
        lookup(name)
    })?;

    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    Ok(config)
}

pub fn open_cache(config: &ClientConfig) -> Arc<LocalCache> {
    Arc::new(LocalCache::new(config.data_dir.clone()))
}

pub fn collector_client(config: &ClientConfig) -> Result<CollectorClient, CliError> {
    Ok(CollectorClient::from_config(config)?)
}

/// Message body from the flag, else from piped stdin.
pub fn read_message(message: Option<String>) -> Result<String, CliError> {
    if let Some(content) = normalize_text_option(message) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyMessage)
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    if io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(normalize_text_option(Some(input)))
}

/// First non-blank line of the message, whitespace collapsed, cut to
/// `max_chars` including the trailing `...`.
pub fn message_preview(submission: &ContactSubmission, max_chars: usize) -> String {
    let collapsed = submission
        .message()
        .and_then(|message| message.lines().find(|line| !line.trim().is_empty()))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut = collapsed
        .char_indices()
        .nth(max_chars.saturating_sub(3))
        .map_or(collapsed.len(), |(index, _)| index);
    format!("{}...", collapsed[..cut].trim_end())
}

/// Parse an ISO-8601 timestamp as written by the form client.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?)
        .ok()
        .map(|date_time| date_time.with_timezone(&Utc))
}

/// Coarse age label such as `5m ago`; future instants read as `just now`.
pub fn format_age(age: TimeDelta) -> String {
    let days = age.num_days();
    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{}m ago", age.num_minutes())
    } else if days < 1 {
        format!("{}h ago", age.num_hours())
    } else if days < 7 {
        format!("{days}d ago")
    } else if days < 30 {
        format!("{}w ago", age.num_weeks())
    } else if days < 365 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}

fn age_label(submission: &ContactSubmission, now: DateTime<Utc>) -> Option<String> {
    parse_timestamp(submission.timestamp()).map(|sent_at| format_age(now - sent_at))
}

pub fn submission_to_list_item(
    submission: &ContactSubmission,
    delivered: Option<bool>,
) -> SubmissionListItem {
    let relative_time = age_label(submission, Utc::now());

    SubmissionListItem {
        id: submission.id.as_ref().map(ToString::to_string),
        name: submission.name().map(ToString::to_string),
        email: submission.email().map(ToString::to_string),
        subject: submission.subject().map(ToString::to_string),
        preview: message_preview(submission, 80),
        timestamp: submission.timestamp().map(ToString::to_string),
        received_at: submission.received_at().map(ToString::to_string),
        relative_time,
        delivered,
    }
}

pub fn format_submission_line(submission: &ContactSubmission, now: DateTime<Utc>) -> String {
    let when = age_label(submission, now).unwrap_or_else(|| "-".to_string());
    let sender = match (submission.name(), submission.email()) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (Some(name), None) => name.to_string(),
        (None, Some(email)) => format!("<{email}>"),
        (None, None) => "(anonymous)".to_string(),
    };
    let subject = submission.subject().unwrap_or("(no subject)");

    format!(
        "{}  {:>8}  {sender}  {subject}: {}",
        submission.id_label(),
        when,
        message_preview(submission, 60)
    )
}

pub fn format_submission_lines(submissions: &[ContactSubmission]) -> Vec<String> {
    let now = Utc::now();
    submissions
        .iter()
        .map(|submission| format_submission_line(submission, now))
        .collect()
}

pub fn format_entry_lines(entries: &[CacheEntry]) -> Vec<String> {
    let now = Utc::now();
    entries
        .iter()
        .map(|entry| {
            let state = if entry.delivered { "sent" } else { "queued" };
            format!(
                "[{state:<6}] {}",
                format_submission_line(&entry.submission, now)
            )
        })
        .collect()
}
