use std::sync::Arc;

use postbox_core::client::{Delivery, FormController, SubmitReceipt, SubmitStatus};
use postbox_core::config::ClientConfig;
use postbox_core::ContactForm;
use serde::Serialize;

use crate::commands::common::{collector_client, open_cache};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SendOutcome {
    pub status: SubmitStatus,
    pub id: Option<String>,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued_reason: Option<String>,
}

impl SendOutcome {
    pub fn from_receipt(status: SubmitStatus, receipt: &SubmitReceipt) -> Self {
        let (delivered, queued_reason) = match &receipt.delivery {
            Delivery::Acknowledged => (true, None),
            Delivery::Queued { reason } => (false, Some(reason.clone())),
        };
        Self {
            status,
            id: receipt.submission.id.as_ref().map(ToString::to_string),
            delivered,
            queued_reason,
        }
    }

    pub fn describe(&self) -> String {
        let id = self.id.as_deref().unwrap_or("<none>");
        if self.delivered {
            format!("Message {id} sent ({})", self.status)
        } else {
            format!(
                "Message {id} saved locally and queued for delivery ({})",
                self.status
            )
        }
    }
}

pub async fn run_send(
    name: &str,
    email: &str,
    subject: &str,
    message: &str,
    as_json: bool,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let mirror = Arc::new(collector_client(config)?);
    let mut controller = FormController::new(
        open_cache(config),
        mirror,
        config.request_timeout,
        config.reset_delay,
    );
    controller.set_form(ContactForm::new(name, email, subject, message));

    let receipt = controller.submit().await?;
    let outcome = SendOutcome::from_receipt(controller.status().current(), &receipt);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.describe());
        if let Some(reason) = outcome.queued_reason.as_deref() {
            eprintln!("Collector unavailable: {reason}");
            eprintln!("Run `postbox sync` to retry delivery.");
        }
    }

    Ok(())
}
