//! Best-effort operator notifications.
//!
//! New inquiries and account withdrawals are posted to a chat webhook (Slack-compatible
//! `{"text": ...}` payload). Delivery runs on a spawned task; its outcome is logged and counted in
//! `denjoy_notifications_total` and never reaches the request that triggered it.

use std::{future::Future, sync::Arc};

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::NotificationsConfig,
    db::models::{inquiries::Inquiry, withdrawal_logs::WithdrawalLog},
    errors::Error,
    types::abbrev_uuid,
};

/// Run `task` in the background, logging and counting its outcome under `channel`.
pub fn spawn_best_effort<F>(channel: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), Error>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = match task.await {
            Ok(()) => "success",
            Err(e) => {
                warn!(channel, error = %e, "Notification delivery failed");
                "failure"
            }
        };
        metrics::counter!("denjoy_notifications_total", "channel" => channel, "outcome" => outcome).increment(1);
    })
}

pub struct ChatNotifier {
    http_client: reqwest::Client,
    webhook_url: Option<Url>,
}

impl ChatNotifier {
    pub fn new(config: &NotificationsConfig) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal {
                operation: format!("create chat webhook client: {e}"),
            })?;

        Ok(Self {
            http_client,
            webhook_url: config.chat_webhook_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post one message and wait for the webhook to answer.
    pub async fn send(&self, text: &str) -> Result<(), Error> {
        let Some(url) = &self.webhook_url else {
            debug!("notifications.chat_webhook_url not set, skipping chat message");
            return Ok(());
        };

        let response = self
            .http_client
            .post(url.clone())
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| Error::Internal {
                operation: format!("post chat notification: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Internal {
                operation: format!("post chat notification: HTTP {}", response.status().as_u16()),
            });
        }

        Ok(())
    }

    /// Fire-and-forget variant of [`ChatNotifier::send`]. Returns `None` when no webhook is configured.
    pub fn notify(self: &Arc<Self>, text: String) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            return None;
        }
        let notifier = Arc::clone(self);
        Some(spawn_best_effort("chat", async move { notifier.send(&text).await }))
    }
}

pub fn inquiry_message(inquiry: &Inquiry) -> String {
    let mut text = format!(
        "New {} inquiry from {} <{}>",
        inquiry.inquiry_type.label(),
        inquiry.name,
        inquiry.email
    );
    if let Some(hospital) = &inquiry.hospital_name {
        text.push_str(&format!(" ({hospital})"));
    }
    text.push_str(&format!("\n{}", inquiry.content));
    text
}

pub fn withdrawal_message(log: &WithdrawalLog) -> String {
    format!(
        "Account withdrawal: user {} ({})\nReason: {}",
        abbrev_uuid(&log.user_id),
        log.email.as_deref().unwrap_or("no email"),
        log.reason.as_deref().unwrap_or("(not given)")
    )
}
