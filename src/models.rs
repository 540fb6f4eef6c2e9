use std::sync::Arc;

use serde::Serialize;

/// One vehicle as read from the feed, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVehicleEntity {
    /// Vehicle descriptor id, or the feed entity id when the descriptor has none
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Heading in degrees clockwise from north
    pub bearing: Option<f64>,
    /// Speed in meters per second
    pub speed: Option<f64>,
    /// Unix timestamp (seconds) of the position fix
    pub timestamp: i64,
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
}

/// A classified vehicle position, as handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehiclePosition {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: Option<f64>,
    pub speed: Option<f64>,
    pub timestamp: i64,
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub moving: bool,
}

impl VehiclePosition {
    /// Speed converted to km/h for display.
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed.map(|s| s * 3.6)
    }
}

impl std::fmt::Display for VehiclePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Train {} at ({:.4}, {:.4}) {} [{}]",
            self.id,
            self.latitude,
            self.longitude,
            if self.moving { "moving" } else { "stopped" },
            chrono::DateTime::<chrono::Utc>::from_timestamp(self.timestamp, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "invalid timestamp".to_string())
        )
    }
}

/// Health of the data behind a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceStatus {
    /// The last cycle committed these records.
    Ok,
    /// No cycle has completed yet.
    Stale,
    /// The last cycle failed; records are from an earlier cycle.
    Error,
}

/// An immutable, fully classified set of vehicle records.
///
/// Snapshots are never mutated. The store replaces the whole value, and a
/// failed cycle produces a new snapshot that shares the previous records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub records: Arc<[VehiclePosition]>,
    /// When `records` were collected (Unix seconds, 0 if never)
    pub fetched_at: i64,
    /// When the most recent cycle ran, successful or not
    pub attempted_at: i64,
    pub source_status: SourceStatus,
    /// Reason the most recent cycle failed, set only with [`SourceStatus::Error`]
    pub last_error: Option<String>,
}

impl Snapshot {
    /// The value the store holds before the first cycle completes.
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            fetched_at: 0,
            attempted_at: 0,
            source_status: SourceStatus::Stale,
            last_error: None,
        }
    }

    pub fn fresh(records: Vec<VehiclePosition>, fetched_at: i64) -> Self {
        Self {
            records: Arc::from(records),
            fetched_at,
            attempted_at: fetched_at,
            source_status: SourceStatus::Ok,
            last_error: None,
        }
    }

    /// Same records, flagged as out of date because of `error`.
    pub fn failed(&self, error: impl Into<String>, attempted_at: i64) -> Self {
        Self {
            records: Arc::clone(&self.records),
            fetched_at: self.fetched_at,
            attempted_at,
            source_status: SourceStatus::Error,
            last_error: Some(error.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
