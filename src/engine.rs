//! Health transition detection
//!
//! Each tick the freshly probed status of every component is compared with the
//! stored snapshot. A component going down fires one DOWN alert per outage and a
//! component coming back fires one UP alert carrying the outage length. The
//! snapshot is persisted before any alert of the tick is sent.

use crate::config::Config;
use crate::notifier::Notifier;
use crate::probe::ProbeResult;
use crate::snapshot::{
    Component, ComponentRecord, HEALTHY, HealthSnapshot, HealthSource, TIMESTAMP_FORMAT, UNHEALTHY,
};
use crate::store::StatusStore;
use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Down,
    /// `downtime_minutes` is `None` when the stored outage start cannot be parsed
    Up { downtime_minutes: Option<i64> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub component: Component,
    pub transition: Transition,
}

/// Outcome of one tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub alerts: Vec<Alert>,
    pub persisted: bool,
    pub probe_failed: bool,
}

/// Renders alert text
#[derive(Clone, Debug)]
pub struct AlertFormat {
    service_name: String,
    mention: String,
}

impl AlertFormat {
    pub fn new(service_name: impl Into<String>, mention: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            mention: mention.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.service_name.clone(), config.mention.clone())
    }

    pub fn label(&self, component: Component) -> String {
        format!("{}-{}", self.service_name, component.key())
    }

    pub fn render(&self, alert: &Alert) -> String {
        let label = self.label(alert.component);
        match alert.transition {
            Transition::Down => format!(
                "Monitor is DOWN: {}. Hi {}, please check service status",
                label, self.mention
            ),
            Transition::Up {
                downtime_minutes: Some(minutes),
            } => format!(
                "Monitor is UP: {}. Hi {}, it was down for {} minutes",
                label, self.mention, minutes
            ),
            Transition::Up {
                downtime_minutes: None,
            } => format!(
                "Monitor is UP: {}. Hi {}, it was down for an unknown duration",
                label, self.mention
            ),
        }
    }
}

/// Whole minutes between `down_since` and `now`, truncated
pub fn downtime_minutes(down_since: &str, now: NaiveDateTime) -> Option<i64> {
    let since = NaiveDateTime::parse_from_str(down_since, TIMESTAMP_FORMAT).ok()?;
    Some((now - since).num_minutes().max(0))
}

/// Status observed for `component` this tick, or `None` if it cannot be evaluated
fn observed_status(component: Component, probe: &ProbeResult) -> Option<&str> {
    match (component.source(), probe) {
        (HealthSource::Reachability, Ok(_)) => Some(HEALTHY),
        (HealthSource::Reachability, Err(_)) => Some(UNHEALTHY),
        (HealthSource::Payload, Ok(report)) => report.status_of(component),
        (HealthSource::Payload, Err(_)) => None,
    }
}

/// Apply one observation to a component record
pub fn observe(
    record: &mut ComponentRecord,
    source: HealthSource,
    observed: &str,
    now: NaiveDateTime,
) -> Option<Transition> {
    let was_healthy = record.is_healthy();
    record.status = observed.to_string();

    if observed != HEALTHY {
        if !record.recovered {
            return None;
        }
        record.down_since = now.format(TIMESTAMP_FORMAT).to_string();
        record.recovered = false;
        return Some(Transition::Down);
    }

    let coming_back = match source {
        HealthSource::Reachability => !was_healthy,
        HealthSource::Payload => !record.recovered,
    };
    if !coming_back {
        return None;
    }

    record.recovered = true;
    Some(Transition::Up {
        downtime_minutes: downtime_minutes(&record.down_since, now),
    })
}

pub struct TransitionEngine {
    store: StatusStore,
    notifier: Box<dyn Notifier>,
    format: AlertFormat,
    /// Set while the file on disk lags behind the in-memory snapshot
    unsaved: bool,
}

impl TransitionEngine {
    pub fn new(store: StatusStore, notifier: Box<dyn Notifier>, format: AlertFormat) -> Self {
        Self {
            store,
            notifier,
            format,
            unsaved: false,
        }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Fold one probe result into `snapshot`, persist it if it changed or an
    /// earlier save failed, then alert
    pub async fn apply(
        &mut self,
        snapshot: &mut HealthSnapshot,
        probe: &ProbeResult,
        now: NaiveDateTime,
    ) -> TickReport {
        let before = snapshot.clone();
        let mut report = TickReport {
            probe_failed: probe.is_err(),
            ..TickReport::default()
        };

        if let Err(e) = probe {
            error!("Health check failed: {}", e);
        }

        for component in Component::ALL {
            let Some(observed) = observed_status(component, probe) else {
                continue;
            };

            if observed != HEALTHY {
                info!("{} is {}", self.format.label(component), observed);
            }

            let record = snapshot.record_mut(component);
            if let Some(transition) = observe(record, component.source(), observed, now) {
                report.alerts.push(Alert {
                    component,
                    transition,
                });
            }
        }

        if *snapshot != before || self.unsaved {
            match self.store.save(snapshot).await {
                Ok(()) => {
                    report.persisted = true;
                    self.unsaved = false;
                }
                Err(e) => {
                    self.unsaved = true;
                    warn!(
                        "Failed to persist status snapshot to {}, keeping in-memory state: {}",
                        self.store.path().display(),
                        e
                    );
                }
            }
        } else {
            debug!("Status snapshot unchanged");
        }

        for alert in &report.alerts {
            match alert.transition {
                Transition::Down => info!(
                    "{} is unhealthy, sending alert",
                    self.format.label(alert.component)
                ),
                Transition::Up { .. } => info!(
                    "{} health recovered, sending alert",
                    self.format.label(alert.component)
                ),
            }
            self.notifier.notify(&self.format.render(alert)).await;
        }

        report
    }
}
