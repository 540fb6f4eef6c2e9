//! Runtime configuration for the refresh pipeline.

use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

/// Finnish rail traffic GTFS-RT vehicle positions.
pub const DEFAULT_FEED_URL: &str = "https://rata.digitraffic.fi/api/v1/trains/gtfs-rt-locations";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MIN_REQUEST_INTERVAL_SECS: u64 = 5;
/// Speed in m/s above which a vehicle counts as moving.
pub const DEFAULT_MOVING_SPEED_THRESHOLD: f64 = 1.0;
pub const DEFAULT_CLIENT_NAME: &str = "TrainTracker";

/// Initial map view handed to the renderer. Not used by the pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

impl Default for MapCenter {
    fn default() -> Self {
        // Geographic centre of Finland.
        Self {
            lat: 62.2426,
            lon: 25.7473,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feed_url: String,
    pub refresh_interval_seconds: u64,
    pub moving_speed_threshold: f64,
    pub fetch_timeout_seconds: u64,
    /// Lower bound on the spacing between two feed requests. Zero disables it.
    pub min_request_interval_seconds: u64,
    /// Sent as the `Digitraffic-User` header.
    pub client_name: String,
    pub map_center: MapCenter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECS,
            moving_speed_threshold: DEFAULT_MOVING_SPEED_THRESHOLD,
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
            min_request_interval_seconds: DEFAULT_MIN_REQUEST_INTERVAL_SECS,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            map_center: MapCenter::default(),
        }
    }
}

impl Config {
    /// Rejects values the scheduler or classifier cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::MissingFeedUrl);
        }
        if self.refresh_interval_seconds == 0 {
            return Err(ConfigError::ZeroDuration("refresh interval"));
        }
        if self.fetch_timeout_seconds == 0 {
            return Err(ConfigError::ZeroDuration("fetch timeout"));
        }
        if !self.moving_speed_threshold.is_finite() || self.moving_speed_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.moving_speed_threshold));
        }
        let MapCenter { lat, lon } = self.map_center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ConfigError::InvalidMapCenter { lat, lon });
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs(self.min_request_interval_seconds)
    }
}
