//! Protobuf decoder for GTFS Realtime vehicle-position feeds.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use prost::Message;
use tracing::debug;

use crate::error::DecodeError;
use crate::gtfs_rt::{FeedEntity, FeedMessage, VehiclePosition as GtfsVehicle};
use crate::models::RawVehicleEntity;
use crate::stats::DecodeStats;

/// Vehicle entities extracted from one feed payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFeed {
    /// One entry per distinct vehicle id, in order of first appearance
    pub entities: Vec<RawVehicleEntity>,
    pub header_timestamp: Option<u64>,
    pub stats: DecodeStats,
}

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns [`DecodeError::Empty`] for a zero-length payload and
/// [`DecodeError::Malformed`] if the bytes are not a valid `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(FeedMessage::decode(bytes)?)
}

/// Decodes `bytes` and extracts the plottable vehicles.
pub fn decode(bytes: &[u8]) -> Result<DecodedFeed, DecodeError> {
    let feed = parse_feed(bytes)?;
    debug!(entities = feed.entity.len(), "Decoded protobuf feed");
    extract_vehicles(&feed)
}

/// Pulls one [`RawVehicleEntity`] out of every vehicle entity with a position.
///
/// Entities without coordinates cannot be plotted and are dropped. When two
/// entities share an id the later one wins and keeps the earlier one's slot.
///
/// # Errors
///
/// Returns [`DecodeError::NoPositions`] if the feed has vehicle entities but
/// none of them carries coordinates. A feed with no vehicle entities at all
/// decodes to an empty list.
pub fn extract_vehicles(feed: &FeedMessage) -> Result<DecodedFeed, DecodeError> {
    let header_timestamp = feed.header.timestamp;
    let fallback_ts = header_timestamp.and_then(|t| i64::try_from(t).ok()).unwrap_or(0);

    let mut stats = DecodeStats {
        total_entities: feed.entity.len(),
        ..Default::default()
    };
    let mut entities: Vec<RawVehicleEntity> = Vec::new();
    // whether each kept entity carried its own timestamp
    let mut own_timestamp: Vec<bool> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for entity in &feed.entity {
        if entity.is_deleted == Some(true) {
            stats.deleted += 1;
            continue;
        }
        let Some(vehicle) = &entity.vehicle else {
            stats.other_entities += 1;
            continue;
        };
        stats.vehicles += 1;

        let Some(raw) = to_raw(entity, vehicle, fallback_ts) else {
            debug!(entity_id = %entity.id, "Dropping vehicle without position");
            stats.dropped_without_position += 1;
            continue;
        };

        match slots.entry(raw.id.clone()) {
            Entry::Occupied(slot) => {
                debug!(vehicle_id = %raw.id, "Duplicate vehicle id, keeping the later entity");
                stats.duplicate_ids += 1;
                entities[*slot.get()] = raw;
                own_timestamp[*slot.get()] = vehicle.timestamp.is_some();
            }
            Entry::Vacant(slot) => {
                slot.insert(entities.len());
                entities.push(raw);
                own_timestamp.push(vehicle.timestamp.is_some());
            }
        }
    }

    if stats.vehicles > 0 && entities.is_empty() {
        return Err(DecodeError::NoPositions {
            vehicles: stats.vehicles,
        });
    }

    stats.kept = entities.len();
    stats.with_timestamp = own_timestamp.iter().filter(|own| **own).count();
    for e in &entities {
        if e.bearing.is_some() {
            stats.with_bearing += 1;
        }
        if e.speed.is_some() {
            stats.with_speed += 1;
        }
        if e.trip_id.is_some() || e.route_id.is_some() {
            stats.with_trip += 1;
        }
    }

    Ok(DecodedFeed {
        entities,
        header_timestamp,
        stats,
    })
}

fn to_raw(entity: &FeedEntity, vehicle: &GtfsVehicle, fallback_ts: i64) -> Option<RawVehicleEntity> {
    let position = vehicle.position.as_ref()?;
    let latitude = f64::from(position.latitude?);
    let longitude = f64::from(position.longitude?);
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }

    let id = vehicle
        .vehicle
        .as_ref()
        .and_then(|v| v.id.as_deref())
        .filter(|id| !id.is_empty())
        .unwrap_or(&entity.id)
        .to_string();

    let timestamp = vehicle
        .timestamp
        .and_then(|t| i64::try_from(t).ok())
        .unwrap_or(fallback_ts);

    let trip = vehicle.trip.as_ref();

    Some(RawVehicleEntity {
        id,
        latitude,
        longitude,
        bearing: position.bearing.map(f64::from),
        speed: position.speed.map(f64::from),
        timestamp,
        trip_id: trip.and_then(|t| t.trip_id.clone()),
        route_id: trip.and_then(|t| t.route_id.clone()),
    })
}
