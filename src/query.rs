//! Read side used by renderers: id filter plus sidebar counts.

use serde::Serialize;

use crate::models::{Snapshot, VehiclePosition};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub matches: Vec<VehiclePosition>,
    pub moving_count: usize,
    pub stopped_count: usize,
    pub total_count: usize,
}

/// Filters `snapshot` by vehicle id.
///
/// The filter is an exact, case-sensitive match on the whole id: `"12"`
/// never returns `"123"`. Surrounding whitespace is ignored, and an absent or
/// blank filter returns every record in stored order. The counts always
/// describe the whole snapshot, not just the matches.
pub fn query(snapshot: &Snapshot, filter_id: Option<&str>) -> QueryResult {
    let records = &snapshot.records;
    let moving_count = records.iter().filter(|r| r.moving).count();

    let matches = match filter_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => records.iter().filter(|r| r.id == id).cloned().collect(),
        None => records.to_vec(),
    };

    QueryResult {
        matches,
        moving_count,
        stopped_count: records.len() - moving_count,
        total_count: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train(id: &str, moving: bool) -> VehiclePosition {
        VehiclePosition {
            id: id.to_string(),
            latitude: 61.0,
            longitude: 25.0,
            bearing: None,
            speed: Some(if moving { 20.0 } else { 0.0 }),
            timestamp: 1_700_000_000,
            trip_id: None,
            route_id: None,
            moving,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::fresh(
            vec![
                train("1234", true),
                train("123", false),
                train("9", true),
                train("IC45", false),
            ],
            1_700_000_000,
        )
    }

    fn ids(result: &QueryResult) -> Vec<&str> {
        result.matches.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_no_filter_returns_all_in_order() {
        let result = query(&snapshot(), None);
        assert_eq!(ids(&result), ["1234", "123", "9", "IC45"]);
        assert_eq!(result.total_count, 4);
        assert_eq!(result.moving_count, 2);
        assert_eq!(result.stopped_count, 2);
    }

    #[test]
    fn test_empty_and_blank_filter_return_all() {
        assert_eq!(query(&snapshot(), Some("")).matches.len(), 4);
        assert_eq!(query(&snapshot(), Some("   ")).matches.len(), 4);
    }

    #[test]
    fn test_exact_match_only() {
        let result = query(&snapshot(), Some("123"));
        assert_eq!(ids(&result), ["123"]);

        let result = query(&snapshot(), Some("12"));
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(ids(&query(&snapshot(), Some("IC45"))), ["IC45"]);
        assert!(query(&snapshot(), Some("ic45")).matches.is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(ids(&query(&snapshot(), Some(" 9 "))), ["9"]);
    }

    #[test]
    fn test_counts_ignore_filter() {
        let result = query(&snapshot(), Some("9"));
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.total_count, 4);
        assert_eq!(result.moving_count, 2);
        assert_eq!(result.stopped_count, 2);

        let none = query(&snapshot(), Some("404"));
        assert!(none.matches.is_empty());
        assert_eq!(none.total_count, 4);
    }

    #[test]
    fn test_empty_snapshot() {
        let result = query(&Snapshot::empty(), Some("1"));
        assert!(result.matches.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.moving_count, 0);
        assert_eq!(result.stopped_count, 0);
    }
}
