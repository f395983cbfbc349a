//! Polling loop driving the transition engine

use crate::config::Config;
use crate::engine::{AlertFormat, TickReport, TransitionEngine};
use crate::errors::{MonitorError, Result};
use crate::notifier::{DiscordNotifier, Notifier};
use crate::probe::{HealthProbe, HttpHealthProbe};
use crate::snapshot::HealthSnapshot;
use crate::store::StatusStore;

use chrono::{Local, NaiveDateTime};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Owns the snapshot and runs one probe-compare-persist-notify cycle per tick
pub struct HealthMonitor {
    probe: Box<dyn HealthProbe>,
    engine: TransitionEngine,
    snapshot: HealthSnapshot,
    poll_interval: Duration,
    monitor_id: String,
}

impl HealthMonitor {
    pub fn new(
        probe: Box<dyn HealthProbe>,
        engine: TransitionEngine,
        snapshot: HealthSnapshot,
        poll_interval: Duration,
    ) -> Self {
        Self {
            probe,
            engine,
            snapshot,
            poll_interval,
            monitor_id: Uuid::new_v4().to_string(),
        }
    }

    /// Read configuration and the stored snapshot, then wire up the HTTP probe and notifier.
    ///
    /// Either file being absent or unparseable aborts startup.
    pub async fn bootstrap(config_path: &Path, status_path: &Path) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        Self::from_config(&config, StatusStore::new(status_path)).await
    }

    pub async fn from_config(config: &Config, store: StatusStore) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let snapshot = store.load().await?;
        let probe = HttpHealthProbe::new(config)?;
        let notifier: Box<dyn Notifier> = Box::new(DiscordNotifier::new(config)?);
        let engine = TransitionEngine::new(store, notifier, AlertFormat::from_config(config));

        info!(
            "Monitoring {} every {} seconds, status file {}",
            probe.health_url(),
            config.interval,
            engine.store().path().display()
        );

        Ok(Self::new(
            Box::new(probe),
            engine,
            snapshot,
            config.poll_interval(),
        ))
    }

    pub fn snapshot(&self) -> &HealthSnapshot {
        &self.snapshot
    }

    pub fn monitor_id(&self) -> &str {
        &self.monitor_id
    }

    /// Run a single health check at the given wall clock time
    #[instrument(skip(self), fields(monitor_id = %self.monitor_id))]
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> TickReport {
        info!("Executing health check");

        let probe = self.probe.probe().await;
        let report = self.engine.apply(&mut self.snapshot, &probe, now).await;

        debug!(
            "Tick finished: {} alerts, persisted: {}",
            report.alerts.len(),
            report.persisted
        );
        report
    }

    pub async fn tick(&mut self) -> TickReport {
        self.tick_at(Local::now().naive_local()).await
    }

    /// Tick until Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Tick until `shutdown` resolves. The first check happens one interval after
    /// start, and `shutdown` is only observed between ticks.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        info!(
            "Monitor {} scheduling health check every {} seconds",
            self.monitor_id,
            self.poll_interval.as_secs()
        );

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                signal = &mut shutdown => {
                    signal.map_err(MonitorError::Signal)?;
                    info!("Shutting down health monitor {}", self.monitor_id);
                    return Ok(());
                }
            }
        }
    }
}
