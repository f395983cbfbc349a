//! Configuration management for the health monitor

use crate::errors::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Airflow webserver, without the `/health` suffix
    pub airflow_url: String,

    /// Poll interval in seconds
    pub interval: u64,

    /// Discord webhook (thread) URL receiving alerts
    pub discord_thread_url: String,

    /// Username shown on alert messages
    pub discord_name: String,

    /// Avatar shown on alert messages
    pub discord_avatar_url: String,

    /// Prefix used to label components in alerts, e.g. `airflow-scheduler`
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Who gets pinged by an alert
    #[serde(default = "default_mention")]
    pub mention: String,
}

fn default_service_name() -> String {
    "airflow".to_string()
}

fn default_mention() -> String {
    "@here".to_string()
}

impl Config {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with(path, |key| env::var(key).ok())
    }

    /// Same as [`Config::from_file`] with an explicit override source
    pub fn from_file_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let mut config: Config = serde_json::from_str(&raw).map_err(|e| {
            MonitorError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;

        config.apply_overrides(lookup);
        config.validate().map_err(MonitorError::Config)?;

        Ok(config)
    }

    /// Override file values with whatever `lookup` yields for the known keys
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("AIRFLOW_URL") {
            self.airflow_url = url;
        }

        if let Some(interval) = lookup("MONITOR_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse() {
                self.interval = seconds;
            }
        }

        if let Some(url) = lookup("DISCORD_WEBHOOK_URL") {
            self.discord_thread_url = url;
        }

        if let Some(name) = lookup("DISCORD_NAME") {
            self.discord_name = name;
        }

        if let Some(avatar) = lookup("DISCORD_AVATAR_URL") {
            self.discord_avatar_url = avatar;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.airflow_url.is_empty() {
            return Err("airflow_url cannot be empty".to_string());
        }

        if self.interval == 0 {
            return Err("interval must be greater than 0".to_string());
        }

        if self.discord_thread_url.is_empty() {
            return Err("discord_thread_url cannot be empty".to_string());
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Full URL of the health endpoint
    pub fn health_url(&self) -> String {
        format!("{}/health", self.airflow_url.trim_end_matches('/'))
    }
}
