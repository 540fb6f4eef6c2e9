//! Error types for the refresh pipeline.
//!
//! A failed fetch or decode aborts the current cycle only; the scheduler
//! records it on the snapshot store and keeps the previous records visible.

use reqwest::StatusCode;
use thiserror::Error;

/// The feed could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("feed request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("feed returned HTTP {0}")]
    Status(StatusCode),

    /// Connection, TLS, or body transfer failure.
    #[error("feed request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("invalid feed url: {0}")]
    InvalidUrl(String),

    /// A local feed file could not be read.
    #[error("failed to read feed file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status)
        } else {
            Self::Request(err)
        }
    }
}

/// The feed bytes could not be turned into vehicle records.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("feed payload is empty")]
    Empty,

    #[error("malformed feed message: {0}")]
    Malformed(#[from] prost::DecodeError),

    /// Every vehicle entity in the feed lacked a usable position.
    #[error("none of the {vehicles} vehicle entities carried a position")]
    NoPositions { vehicles: usize },
}

/// Why a refresh cycle was abandoned.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl RefreshError {
    /// Short machine-readable label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch_failure",
            Self::Decode(_) => "decode_failure",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("moving speed threshold must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),

    #[error("feed url must not be empty")]
    MissingFeedUrl,

    #[error("map center ({lat}, {lon}) is outside valid coordinates")]
    InvalidMapCenter { lat: f64, lon: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_error_kind() {
        let fetch: RefreshError = FetchError::Timeout.into();
        assert_eq!(fetch.kind(), "fetch_failure");

        let decode: RefreshError = DecodeError::Empty.into();
        assert_eq!(decode.kind(), "decode_failure");
    }

    #[test]
    fn test_refresh_error_display_is_transparent() {
        let err: RefreshError = FetchError::Status(StatusCode::SERVICE_UNAVAILABLE).into();
        assert_eq!(err.to_string(), "feed returned HTTP 503 Service Unavailable");
    }

    #[test]
    fn test_no_positions_message() {
        let err = DecodeError::NoPositions { vehicles: 4 };
        assert_eq!(err.to_string(), "none of the 4 vehicle entities carried a position");
    }
}
