use serde::Serialize;

/// Counters collected while decoding one feed payload.
///
/// `vehicles == kept + dropped_without_position + duplicate_ids` always holds,
/// which makes the number of excluded entities checkable from the outside.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub total_entities: usize,

    // entity types
    pub vehicles: usize,
    pub other_entities: usize,
    pub deleted: usize,

    // outcome per vehicle entity
    pub kept: usize,
    pub dropped_without_position: usize,
    pub duplicate_ids: usize,

    // optional field coverage among kept vehicles
    pub with_bearing: usize,
    pub with_speed: usize,
    pub with_timestamp: usize,
    pub with_trip: usize,
}

impl DecodeStats {
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn speed_pct(&self) -> f64 {
        Self::pct(self.with_speed, self.kept)
    }

    pub fn bearing_pct(&self) -> f64 {
        Self::pct(self.with_bearing, self.kept)
    }

    /// Vehicle entities that did not become a record of their own.
    pub fn excluded(&self) -> usize {
        self.dropped_without_position + self.duplicate_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(DecodeStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(DecodeStats::pct(50, 100), 50.0);
        assert_eq!(DecodeStats::pct(1, 4), 25.0);
    }

    #[test]
    fn test_coverage_pcts() {
        let stats = DecodeStats {
            kept: 4,
            with_speed: 3,
            with_bearing: 1,
            ..Default::default()
        };
        assert_eq!(stats.speed_pct(), 75.0);
        assert_eq!(stats.bearing_pct(), 25.0);
    }

    #[test]
    fn test_excluded() {
        let stats = DecodeStats {
            vehicles: 5,
            kept: 2,
            dropped_without_position: 2,
            duplicate_ids: 1,
            ..Default::default()
        };
        assert_eq!(stats.excluded(), 3);
        assert_eq!(stats.kept + stats.excluded(), stats.vehicles);
    }
}
