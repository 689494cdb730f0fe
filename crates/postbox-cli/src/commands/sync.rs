use postbox_core::client::sync_pending;
use postbox_core::config::ClientConfig;

use crate::commands::common::{collector_client, open_cache};
use crate::error::CliError;

pub async fn run_sync(as_json: bool, config: &ClientConfig) -> Result<(), CliError> {
    let cache = open_cache(config);
    let collector = collector_client(config)?;
    let report = sync_pending(&cache, &collector, config.request_timeout).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.delivered == 0 && report.remaining == 0 {
        println!("Outbox is empty.");
    } else {
        println!(
            "Delivered {} message(s), {} still queued",
            report.delivered, report.remaining
        );
    }

    Ok(())
}
