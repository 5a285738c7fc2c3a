//! Normalization of raw station records.
//!
//! Records come from several server versions with different field names
//! and frequently missing values. Every record becomes a
//! [`StationSummary`]; absent or unusable fields are replaced with fixed
//! defaults and reported back so the caller can keep count of them.

use serde_json::Value;

use crate::domain::{Capacity, StationId, StationStatus, StationSummary};

pub const DEFAULT_NAME: &str = "Unnamed station";
pub const DEFAULT_PRICE: u32 = 25;
pub const DEFAULT_RATING: f32 = 4.5;
pub const DEFAULT_ETA: &str = "< 5 min";

/// A normalized record plus the fields that had to be defaulted.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub station: StationSummary,
    pub defaulted: Vec<&'static str>,
}

/// Normalize the record at position `index` of a directory response.
pub fn normalize_record(index: usize, record: &Value) -> Normalized {
    let mut defaulted = Vec::new();

    let id = text(record, &["id", "stationID", "stationId"])
        .and_then(|raw| StationId::parse(&raw).ok())
        .unwrap_or_else(|| {
            defaulted.push("id");
            StationId::placeholder(index)
        });

    let name = text(record, &["name", "stationName"])
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            defaulted.push("name");
            DEFAULT_NAME.to_string()
        });

    let address = text(record, &["address"]).unwrap_or_else(|| {
        defaulted.push("address");
        String::new()
    });

    let available = count(record, &["available", "availableSlots", "inventory"]).unwrap_or_else(|| {
        defaulted.push("available");
        0
    });

    let total = count(record, &["total", "totalSlots", "inventory"]).unwrap_or_else(|| {
        defaulted.push("total");
        available
    });

    let status = match text(record, &["status"]) {
        Some(raw) => StationStatus::parse_lenient(&raw),
        None => {
            defaulted.push("status");
            StationStatus::Maintenance
        }
    };

    let price = number(record, &["price", "pricePerSwap"])
        .filter(|p| *p >= 0.0 && *p <= u32::MAX as f64)
        .map(|p| p.round() as u32)
        .unwrap_or_else(|| {
            defaulted.push("price");
            DEFAULT_PRICE
        });

    let rating = number(record, &["rating"])
        .map(|r| r.clamp(0.0, 5.0) as f32)
        .unwrap_or_else(|| {
            defaulted.push("rating");
            DEFAULT_RATING
        });

    let eta = text(record, &["eta", "time"]).unwrap_or_else(|| DEFAULT_ETA.to_string());

    let station = StationSummary {
        id,
        name,
        address,
        capacity: Capacity::new(available, total),
        status,
        price,
        rating,
        distance_km: number(record, &["distanceKm", "distance"]).filter(|d| *d >= 0.0),
        eta,
        latitude: number(record, &["latitude", "lat"]),
        longitude: number(record, &["longitude", "lng"]),
    };

    Normalized { station, defaulted }
}

/// First present, non-null field among `names`.
fn field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| record.get(n))
        .find(|v| !v.is_null())
}

fn text(record: &Value, names: &[&str]) -> Option<String> {
    match field(record, names)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        _ => None,
    }
}

fn number(record: &Value, names: &[&str]) -> Option<f64> {
    let value = match field(record, names)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn count(record: &Value, names: &[&str]) -> Option<u32> {
    number(record, names)
        .filter(|n| *n >= 0.0)
        .map(|n| n.min(u32::MAX as f64).round() as u32)
}
