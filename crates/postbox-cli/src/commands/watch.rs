use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use postbox_core::client::{sync_pending, OutboxSync, SyncReport};
use postbox_core::collector::SubmissionMirror;
use postbox_core::config::ClientConfig;

use crate::commands::common::{collector_client, open_cache};
use crate::error::CliError;

pub async fn run_watch(interval_secs: Option<u64>, config: &ClientConfig) -> Result<(), CliError> {
    let interval = match interval_secs {
        Some(0) => {
            return Err(CliError::Config(
                "--interval must be at least 1 second".to_string(),
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => config.sync_interval,
    };

    let first_pass = watch_outbox(config, interval, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to listen for Ctrl+C");
        }
    })
    .await?;

    println!(
        "Stopped watching ({} delivered on start, {} were still queued)",
        first_pass.delivered, first_pass.remaining
    );
    Ok(())
}

/// Drain the outbox once, then keep retrying in the background until
/// `shutdown` resolves.
pub async fn watch_outbox(
    config: &ClientConfig,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<SyncReport, CliError> {
    let cache = open_cache(config);
    let mirror: Arc<dyn SubmissionMirror> = Arc::new(collector_client(config)?);

    let first_pass = sync_pending(&cache, mirror.as_ref(), config.request_timeout).await?;
    println!(
        "Watching outbox in {} every {}s (Ctrl+C to stop)",
        cache.dir().display(),
        interval.as_secs()
    );

    let worker = OutboxSync::spawn(cache, mirror, interval, config.request_timeout);
    shutdown.await;
    worker.stop().await;

    Ok(first_pass)
}
