//! Airflow Health Monitor Library
//!
//! This library polls an Airflow deployment's health endpoint, tracks the
//! webserver, metadatabase and scheduler across restarts in a status file, and
//! posts alerts to a Discord webhook whenever one of them goes down or recovers.

pub mod config;
pub mod engine;
pub mod errors;
pub mod monitor;
pub mod notifier;
pub mod probe;
pub mod snapshot;
pub mod store;

pub use config::Config;
pub use engine::{Alert, AlertFormat, TickReport, Transition, TransitionEngine};
pub use errors::{MonitorError, Result};
pub use monitor::HealthMonitor;
pub use notifier::{DiscordNotifier, Notifier, WebhookMessage};
pub use probe::{HealthProbe, HealthReport, HttpHealthProbe, ProbeError};
pub use snapshot::{Component, ComponentRecord, HealthSnapshot};
pub use store::StatusStore;
