//! Webhook alert delivery

use crate::config::Config;
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Body posted to the webhook
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub content: String,
    pub username: String,
    pub avatar_url: String,
}

/// Best-effort alert sink. Delivery problems are logged, never returned.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Posts alerts to a Discord-compatible webhook
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
    avatar_url: String,
}

impl DiscordNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.poll_interval().max(Duration::from_secs(1)))
            .user_agent(format!("airflow_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self {
            client,
            webhook_url: config.discord_thread_url.clone(),
            username: config.discord_name.clone(),
            avatar_url: config.discord_avatar_url.clone(),
        })
    }

    pub fn message(&self, content: &str) -> WebhookMessage {
        WebhookMessage {
            content: content.to_string(),
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, message: &str) {
        let payload = self.message(message);

        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Successfully sent alert to Discord");
            }
            Ok(response) => {
                warn!("Discord webhook answered with status {}", response.status());
            }
            Err(e) => {
                error!("Failed to send alert to Discord: {}", e);
            }
        }
    }
}
