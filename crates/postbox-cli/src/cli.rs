use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "postbox")]
#[command(about = "Send contact messages to a portfolio collector, local-first")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Collector base URL (overrides POSTBOX_COLLECTOR_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub collector_url: Option<String>,

    /// Directory for the local cache and outbox (overrides POSTBOX_DATA_DIR)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a contact message
    Send {
        /// Sender name
        #[arg(long)]
        name: String,
        /// Sender email
        #[arg(long)]
        email: String,
        /// Message subject
        #[arg(long)]
        subject: String,
        /// Message body (read from stdin when omitted)
        #[arg(short, long)]
        message: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List locally cached messages and their delivery state
    Outbox {
        /// Only show messages still waiting for delivery
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retry delivery of queued messages once
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep retrying queued messages until interrupted
    Watch {
        /// Seconds between passes (overrides POSTBOX_SYNC_INTERVAL_SECS)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Show messages stored by the collector
    Inbox {
        /// Only show the most recent N messages
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}
