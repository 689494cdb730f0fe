use postbox_core::config::ClientConfig;

use crate::commands::common::{
    format_entry_lines, open_cache, submission_to_list_item, SubmissionListItem,
};
use crate::error::CliError;

pub async fn run_outbox(
    pending_only: bool,
    as_json: bool,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let cache = open_cache(config);
    let mut entries = cache.entries().await?;
    if pending_only {
        entries.retain(|entry| !entry.delivered);
    }

    if as_json {
        let json_items = entries
            .iter()
            .map(|entry| submission_to_list_item(&entry.submission, Some(entry.delivered)))
            .collect::<Vec<SubmissionListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if entries.is_empty() {
        if pending_only {
            println!("Outbox is empty.");
        } else {
            println!("No messages cached in {}.", cache.dir().display());
        }
        return Ok(());
    }

    for line in format_entry_lines(&entries) {
        println!("{line}");
    }
    Ok(())
}
