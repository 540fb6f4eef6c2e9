//! Output formatting for one-shot snapshot runs.
//!
//! Supports a logged vehicle list, pretty debug output, and JSON to any writer.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::query::QueryResult;

/// Logs the query result using Rust's debug pretty-print format.
pub fn print_pretty(result: &QueryResult) {
    debug!("{:#?}", result);
}

/// Logs one line per matching vehicle followed by the sidebar totals.
pub fn print_list(result: &QueryResult) {
    for vehicle in &result.matches {
        match vehicle.speed_kmh() {
            Some(kmh) => info!(route = ?vehicle.route_id, "{vehicle} {kmh:.1} km/h"),
            None => info!(route = ?vehicle.route_id, "{vehicle} speed n/a"),
        }
    }
    info!(
        matches = result.matches.len(),
        moving = result.moving_count,
        stopped = result.stopped_count,
        total = result.total_count,
        "Active trains"
    );
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Snapshot, VehiclePosition};
    use crate::query::query;

    fn result() -> QueryResult {
        let snapshot = Snapshot::fresh(
            vec![VehiclePosition {
                id: "27".to_string(),
                latitude: 60.17,
                longitude: 24.94,
                bearing: None,
                speed: Some(25.0),
                timestamp: 1_700_000_000,
                trip_id: Some("27_20231114".to_string()),
                route_id: None,
                moving: true,
            }],
            1_700_000_000,
        );
        query(&snapshot, None)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&result());
    }

    #[test]
    fn test_print_list_does_not_panic() {
        print_list(&result());
        print_list(&query(&Snapshot::empty(), None));
    }

    #[test]
    fn test_write_json() {
        let mut buf = Vec::new();
        write_json(&mut buf, &result()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["total_count"], 1);
        assert_eq!(value["matches"][0]["id"], "27");
        assert_eq!(value["matches"][0]["speed"], 25.0);
    }
}
