//! Persisted health snapshot and the monitored components

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only status value treated as good
pub const HEALTHY: &str = "healthy";

/// Status recorded for the webserver when it cannot be reached
pub const UNHEALTHY: &str = "unhealthy";

/// Wall clock format used for `down_since` timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where a component's health comes from on each tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthSource {
    /// Healthy whenever the health endpoint answers with a decodable payload
    Reachability,
    /// Healthy when its status field in the payload reads `healthy`
    Payload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Webserver,
    Metadatabase,
    Scheduler,
}

impl Component {
    /// Evaluation order within a tick
    pub const ALL: [Component; 3] = [
        Component::Webserver,
        Component::Metadatabase,
        Component::Scheduler,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Component::Webserver => "webserver",
            Component::Metadatabase => "metadatabase",
            Component::Scheduler => "scheduler",
        }
    }

    pub fn source(&self) -> HealthSource {
        match self {
            Component::Webserver => HealthSource::Reachability,
            Component::Metadatabase | Component::Scheduler => HealthSource::Payload,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Last known state of one component
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRecord {
    pub status: String,
    /// Start of the current outage; stale once `recovered` is set again
    pub down_since: String,
    /// Latch: false while an outage is open and its DOWN alert has gone out
    pub recovered: bool,
}

impl ComponentRecord {
    pub fn healthy() -> Self {
        Self {
            status: HEALTHY.to_string(),
            down_since: String::new(),
            recovered: true,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HEALTHY
    }
}

/// Snapshot of every monitored component, persisted between runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotFile", into = "SnapshotFile")]
pub struct HealthSnapshot {
    pub webserver: ComponentRecord,
    pub metadatabase: ComponentRecord,
    pub scheduler: ComponentRecord,
}

impl HealthSnapshot {
    /// Every component healthy and never down
    pub fn all_healthy() -> Self {
        Self {
            webserver: ComponentRecord::healthy(),
            metadatabase: ComponentRecord::healthy(),
            scheduler: ComponentRecord::healthy(),
        }
    }

    pub fn record(&self, component: Component) -> &ComponentRecord {
        match component {
            Component::Webserver => &self.webserver,
            Component::Metadatabase => &self.metadatabase,
            Component::Scheduler => &self.scheduler,
        }
    }

    pub fn record_mut(&mut self, component: Component) -> &mut ComponentRecord {
        match component {
            Component::Webserver => &mut self.webserver,
            Component::Metadatabase => &mut self.metadatabase,
            Component::Scheduler => &mut self.scheduler,
        }
    }
}

/// On-disk layout: three flat fields per component
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SnapshotFile {
    webserver_status: String,
    webserver_downtime: String,
    webserver_recovered: bool,
    metadatabase_status: String,
    metadatabase_downtime: String,
    metadatabase_recovered: bool,
    scheduler_status: String,
    scheduler_downtime: String,
    scheduler_recovered: bool,
}

impl From<SnapshotFile> for HealthSnapshot {
    fn from(file: SnapshotFile) -> Self {
        Self {
            webserver: ComponentRecord {
                status: file.webserver_status,
                down_since: file.webserver_downtime,
                recovered: file.webserver_recovered,
            },
            metadatabase: ComponentRecord {
                status: file.metadatabase_status,
                down_since: file.metadatabase_downtime,
                recovered: file.metadatabase_recovered,
            },
            scheduler: ComponentRecord {
                status: file.scheduler_status,
                down_since: file.scheduler_downtime,
                recovered: file.scheduler_recovered,
            },
        }
    }
}

impl From<HealthSnapshot> for SnapshotFile {
    fn from(snapshot: HealthSnapshot) -> Self {
        Self {
            webserver_status: snapshot.webserver.status,
            webserver_downtime: snapshot.webserver.down_since,
            webserver_recovered: snapshot.webserver.recovered,
            metadatabase_status: snapshot.metadatabase.status,
            metadatabase_downtime: snapshot.metadatabase.down_since,
            metadatabase_recovered: snapshot.metadatabase.recovered,
            scheduler_status: snapshot.scheduler.status,
            scheduler_downtime: snapshot.scheduler.down_since,
            scheduler_recovered: snapshot.scheduler.recovered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_serializes_nine_flat_fields() {
        let mut snapshot = HealthSnapshot::all_healthy();
        snapshot.scheduler = ComponentRecord {
            status: "unhealthy".to_string(),
            down_since: "2024-01-01 10:00:00".to_string(),
            recovered: false,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 9);
        assert_eq!(value["scheduler_status"], "unhealthy");
        assert_eq!(value["scheduler_downtime"], "2024-01-01 10:00:00");
        assert_eq!(value["scheduler_recovered"], Value::Bool(false));
        assert_eq!(value["webserver_recovered"], Value::Bool(true));
    }

    #[test]
    fn test_deserializes_from_flat_layout() {
        let value = json!({
            "webserver_status": "healthy",
            "webserver_downtime": "",
            "webserver_recovered": true,
            "metadatabase_status": "degraded",
            "metadatabase_downtime": "2024-03-02 08:15:00",
            "metadatabase_recovered": false,
            "scheduler_status": "healthy",
            "scheduler_downtime": "2024-02-01 00:00:00",
            "scheduler_recovered": true
        });

        let snapshot: HealthSnapshot = serde_json::from_value(value).unwrap();
        assert!(snapshot.webserver.is_healthy());
        assert_eq!(snapshot.metadatabase.status, "degraded");
        assert!(!snapshot.metadatabase.recovered);
        assert_eq!(snapshot.scheduler.down_since, "2024-02-01 00:00:00");
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let value = json!({
            "webserver_status": "healthy",
            "webserver_downtime": "",
            "webserver_recovered": true
        });

        assert!(serde_json::from_value::<HealthSnapshot>(value).is_err());
    }

    #[test]
    fn test_fresh_snapshot_holds_latch_invariant() {
        let snapshot = HealthSnapshot::all_healthy();
        for component in Component::ALL {
            let record = snapshot.record(component);
            assert!(record.is_healthy());
            assert!(record.recovered);
            assert!(record.down_since.is_empty());
        }
    }

    #[test]
    fn test_component_sources() {
        assert_eq!(Component::Webserver.source(), HealthSource::Reachability);
        assert_eq!(Component::Metadatabase.source(), HealthSource::Payload);
        assert_eq!(Component::Scheduler.source(), HealthSource::Payload);
        assert_eq!(Component::ALL[0], Component::Webserver);
    }

    #[test]
    fn test_record_mut_targets_component() {
        let mut snapshot = HealthSnapshot::all_healthy();
        snapshot.record_mut(Component::Metadatabase).recovered = false;

        assert!(!snapshot.record(Component::Metadatabase).recovered);
        assert!(snapshot.record(Component::Webserver).recovered);
        assert!(snapshot.record(Component::Scheduler).recovered);
    }
}
