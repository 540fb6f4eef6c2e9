//! Moving/stationary classification.

use crate::config::DEFAULT_MOVING_SPEED_THRESHOLD;
use crate::models::{RawVehicleEntity, VehiclePosition};

/// Derives the `moving` flag from reported speed.
///
/// A vehicle is moving only when it reports a speed strictly above the
/// threshold. No speed means stationary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    threshold: f64,
}

impl Classifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_moving(&self, speed: Option<f64>) -> bool {
        speed.is_some_and(|s| s > self.threshold)
    }

    pub fn classify(&self, raw: &RawVehicleEntity) -> VehiclePosition {
        VehiclePosition {
            id: raw.id.clone(),
            latitude: raw.latitude,
            longitude: raw.longitude,
            bearing: raw.bearing,
            speed: raw.speed,
            timestamp: raw.timestamp,
            trip_id: raw.trip_id.clone(),
            route_id: raw.route_id.clone(),
            moving: self.is_moving(raw.speed),
        }
    }

    pub fn classify_all(&self, raw: &[RawVehicleEntity]) -> Vec<VehiclePosition> {
        raw.iter().map(|r| self.classify(r)).collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_MOVING_SPEED_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(speed: Option<f64>) -> RawVehicleEntity {
        RawVehicleEntity {
            id: "265".to_string(),
            latitude: 60.17,
            longitude: 24.94,
            bearing: Some(45.0),
            speed,
            timestamp: 1_700_000_000,
            trip_id: Some("trip".to_string()),
            route_id: None,
        }
    }

    #[test]
    fn test_speed_above_threshold_is_moving() {
        assert!(Classifier::default().classify(&raw(Some(5.0))).moving);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let classifier = Classifier::default();
        assert!(!classifier.classify(&raw(Some(1.0))).moving);
        assert!(classifier.classify(&raw(Some(1.0001))).moving);
    }

    #[test]
    fn test_zero_and_absent_speed_are_stopped() {
        let classifier = Classifier::default();
        assert!(!classifier.classify(&raw(Some(0.0))).moving);
        assert!(!classifier.classify(&raw(None)).moving);
    }

    #[test]
    fn test_nan_speed_is_stopped() {
        assert!(!Classifier::default().classify(&raw(Some(f64::NAN))).moving);
    }

    #[test]
    fn test_classify_over_speed_range() {
        let classifier = Classifier::default();
        for tenths in -20..200 {
            let speed = f64::from(tenths) / 10.0;
            assert_eq!(classifier.classify(&raw(Some(speed))).moving, speed > 1.0);
        }
    }

    #[test]
    fn test_classify_is_deterministic_and_copies_fields() {
        let classifier = Classifier::new(2.5);
        let input = raw(Some(3.0));
        let first = classifier.classify(&input);
        let second = classifier.classify(&input);

        assert_eq!(first, second);
        assert_eq!(first.id, input.id);
        assert_eq!(first.bearing, input.bearing);
        assert_eq!(first.trip_id, input.trip_id);
        assert_eq!(first.timestamp, input.timestamp);
        assert!(first.moving);
    }

    #[test]
    fn test_custom_threshold() {
        let classifier = Classifier::new(10.0);
        assert!(!classifier.is_moving(Some(9.9)));
        assert!(classifier.is_moving(Some(10.1)));
        assert_eq!(classifier.threshold(), 10.0);
    }
}
