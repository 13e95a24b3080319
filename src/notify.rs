// ABOUTME: Fire-and-forget completion notifications
// ABOUTME: Webhook transport (Discord-style JSON body) plus a no-op sink

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Outbound channel for the end-of-run message
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": message}` to a webhook URL
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .send()
            .await
            .context("Failed to send webhook notification")?
            .error_for_status()
            .context("Webhook rejected notification")?;

        Ok(())
    }
}

/// Used when no webhook is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        tracing::debug!("No notification endpoint configured, skipping: {}", message);
        Ok(())
    }
}

/// Pick the transport for an optional webhook URL
pub fn from_url(url: Option<&str>) -> Result<Box<dyn Notifier>> {
    match url {
        Some(url) => Ok(Box::new(WebhookNotifier::new(url)?)),
        None => Ok(Box::new(NoopNotifier)),
    }
}

/// Deliver `message`, logging instead of failing when delivery does not work
pub async fn notify_best_effort(notifier: &dyn Notifier, message: &str) {
    match notifier.notify(message).await {
        Ok(()) => tracing::info!("Notification sent"),
        Err(e) => tracing::warn!("Error sending notification: {:#}", e),
    }
}
