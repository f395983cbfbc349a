//! Polling the Airflow `/health` endpoint

use crate::config::Config;
use crate::errors::{MonitorError, Result};
use crate::snapshot::{Component, HEALTHY};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Health payload returned by Airflow
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub metadatabase: ComponentHealth,
    pub scheduler: SchedulerHealth,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerHealth {
    pub status: String,
    #[serde(default)]
    pub latest_scheduler_heartbeat: Option<String>,
}

impl HealthReport {
    /// Both payload components reporting `healthy`
    pub fn healthy() -> Self {
        Self::with_statuses(HEALTHY, HEALTHY)
    }

    pub fn with_statuses(metadatabase: &str, scheduler: &str) -> Self {
        Self {
            metadatabase: ComponentHealth {
                status: metadatabase.to_string(),
            },
            scheduler: SchedulerHealth {
                status: scheduler.to_string(),
                latest_scheduler_heartbeat: None,
            },
        }
    }

    /// Status reported for `component`; the webserver has no field of its own
    pub fn status_of(&self, component: Component) -> Option<&str> {
        match component {
            Component::Webserver => None,
            Component::Metadatabase => Some(&self.metadatabase.status),
            Component::Scheduler => Some(&self.scheduler.status),
        }
    }
}

/// Why a probe produced no health payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Connection refused, DNS failure, timeout
    Unreachable(String),

    /// Response body is not the expected health document
    MalformedResponse(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Unreachable(msg) => write!(f, "Cannot make request: {}", msg),
            ProbeError::MalformedResponse(msg) => write!(f, "Cannot parse response: {}", msg),
        }
    }
}

impl std::error::Error for ProbeError {}

pub type ProbeResult = std::result::Result<HealthReport, ProbeError>;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> ProbeResult;
}

/// Probe issuing `GET <airflow_url>/health`
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: Client,
    health_url: String,
}

impl HttpHealthProbe {
    /// The request timeout never exceeds one poll interval.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(config.health_url(), config.poll_interval())
    }

    pub fn with_timeout(health_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("airflow_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self { client, health_url })
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self) -> ProbeResult {
        debug!("Performing health check against {}", self.health_url);

        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        debug!("Health endpoint answered with status {}", response.status());

        // The status code is not consulted: only a decodable body counts as reachable.
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| ProbeError::MalformedResponse(e.to_string()))
    }
}
