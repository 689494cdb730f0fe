use postbox_core::config::ClientConfig;

use crate::commands::common::{
    collector_client, format_submission_lines, submission_to_list_item, SubmissionListItem,
};
use crate::error::CliError;

pub async fn run_inbox(
    limit: Option<usize>,
    as_json: bool,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let collector = collector_client(config)?;
    let mut messages = collector.list().await?;
    if let Some(limit) = limit {
        let skip = messages.len().saturating_sub(limit);
        messages = messages.split_off(skip);
    }

    if as_json {
        let json_items = messages
            .iter()
            .map(|submission| submission_to_list_item(submission, None))
            .collect::<Vec<SubmissionListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("No messages stored at {}.", collector.base_url());
        return Ok(());
    }

    for line in format_submission_lines(&messages) {
        println!("{line}");
    }
    Ok(())
}
