//! Station types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Server-assigned station identifier.
///
/// The directory API returns numeric ids; they are carried as strings so
/// the client never depends on the server's id representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    /// Parse a station id. Surrounding whitespace is trimmed.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyStationId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Stand-in id for a directory record that arrived without one.
    pub fn placeholder(index: usize) -> Self {
        Self(format!("unknown-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operational status of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Open,
    Maintenance,
    Closed,
}

impl StationStatus {
    /// Read a server status string.
    ///
    /// Matching is case-insensitive. Anything that is neither open nor
    /// closed is treated as maintenance, so a station is never shown as
    /// bookable unless the server says so.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => StationStatus::Open,
            "closed" => StationStatus::Closed,
            _ => StationStatus::Maintenance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Open => "open",
            StationStatus::Maintenance => "maintenance",
            StationStatus::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, StationStatus::Open)
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swap slot capacity of a station.
///
/// Invariant: `available <= total`. Construction clamps `available`
/// down to `total` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CapacityParts")]
pub struct Capacity {
    available: u32,
    total: u32,
}

#[derive(Deserialize)]
struct CapacityParts {
    available: u32,
    total: u32,
}

impl From<CapacityParts> for Capacity {
    fn from(parts: CapacityParts) -> Self {
        Capacity::new(parts.available, parts.total)
    }
}

impl Capacity {
    pub fn new(available: u32, total: u32) -> Self {
        Self {
            available: available.min(total),
            total,
        }
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

/// Search radius for the nearby-station lookup.
///
/// Only the fixed candidate set is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Radius {
    Two,
    #[default]
    Five,
    Ten,
    Twenty,
}

impl Radius {
    /// All supported radii, smallest first.
    pub const ALL: [Radius; 4] = [Radius::Two, Radius::Five, Radius::Ten, Radius::Twenty];

    pub fn km(&self) -> u32 {
        match self {
            Radius::Two => 2,
            Radius::Five => 5,
            Radius::Ten => 10,
            Radius::Twenty => 20,
        }
    }

    pub fn from_km(km: u32) -> Result<Self, DomainError> {
        match km {
            2 => Ok(Radius::Two),
            5 => Ok(Radius::Five),
            10 => Ok(Radius::Ten),
            20 => Ok(Radius::Twenty),
            other => Err(DomainError::InvalidRadius(other)),
        }
    }
}

impl TryFrom<u32> for Radius {
    type Error = DomainError;

    fn try_from(km: u32) -> Result<Self, Self::Error> {
        Radius::from_km(km)
    }
}

impl From<Radius> for u32 {
    fn from(r: Radius) -> Self {
        r.km()
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km", self.km())
    }
}

/// One row of the nearby-station list.
///
/// Built fresh from every directory fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub id: StationId,
    pub name: String,
    pub address: String,
    pub capacity: Capacity,
    pub status: StationStatus,
    /// Price per swap.
    pub price: u32,
    /// Average rating, 0 to 5.
    pub rating: f32,
    /// Distance from the caller as reported by the server.
    pub distance_km: Option<f64>,
    /// Rough wait estimate shown on the card.
    pub eta: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StationSummary {
    /// Distance formatted for display, e.g. `"1.24 km"`.
    pub fn distance_display(&self) -> String {
        match self.distance_km {
            Some(km) => format!("{km:.2} km"),
            None => "?".to_string(),
        }
    }

    /// Case-insensitive substring match on name or address.
    ///
    /// An empty (or all-whitespace) query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.address.to_lowercase().contains(&needle)
    }

    /// Station position, when the server supplied a valid one.
    pub fn position(&self) -> Option<super::Coordinates> {
        let lat = self.latitude?;
        let lng = self.longitude?;
        super::Coordinates::new(lat, lng).ok()
    }
}

/// Filter a fetched station list by a free-text query.
///
/// Purely local: this never triggers a refetch.
pub fn filter_stations<'a>(stations: &'a [StationSummary], query: &str) -> Vec<&'a StationSummary> {
    stations.iter().filter(|s| s.matches(query)).collect()
}

#[cfg(test)]
pub(crate) fn sample_station(id: &str, name: &str, address: &str) -> StationSummary {
    StationSummary {
        id: StationId::parse(id).unwrap(),
        name: name.to_string(),
        address: address.to_string(),
        capacity: Capacity::new(12, 20),
        status: StationStatus::Open,
        price: 25,
        rating: 4.8,
        distance_km: Some(0.8),
        eta: "< 5 min".to_string(),
        latitude: Some(10.76),
        longitude: Some(106.66),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_id_trims_and_rejects_empty() {
        assert_eq!(StationId::parse(" 12 ").unwrap().as_str(), "12");
        assert_eq!(StationId::parse("   "), Err(DomainError::EmptyStationId));
    }

    #[test]
    fn status_parsing_is_lenient() {
        assert_eq!(StationStatus::parse_lenient("OPEN"), StationStatus::Open);
        assert_eq!(StationStatus::parse_lenient("open"), StationStatus::Open);
        assert_eq!(StationStatus::parse_lenient("Closed"), StationStatus::Closed);
        assert_eq!(
            StationStatus::parse_lenient("MAINTENANCE"),
            StationStatus::Maintenance
        );
        assert_eq!(StationStatus::parse_lenient(""), StationStatus::Maintenance);
        assert_eq!(
            StationStatus::parse_lenient("busy"),
            StationStatus::Maintenance
        );
    }

    #[test]
    fn capacity_clamps_available() {
        let c = Capacity::new(30, 20);
        assert_eq!(c.available(), 20);
        assert_eq!(c.total(), 20);

        let c: Capacity = serde_json::from_str(r#"{"available": 9, "total": 4}"#).unwrap();
        assert_eq!(c.available(), 4);
    }

    #[test]
    fn radius_candidates() {
        for km in [2, 5, 10, 20] {
            assert_eq!(Radius::from_km(km).unwrap().km(), km);
        }
        assert_eq!(Radius::from_km(3), Err(DomainError::InvalidRadius(3)));
        assert_eq!(Radius::default(), Radius::Five);
    }

    #[test]
    fn radius_serde() {
        let r: Radius = serde_json::from_str("10").unwrap();
        assert_eq!(r, Radius::Ten);
        assert_eq!(serde_json::to_string(&Radius::Two).unwrap(), "2");
        assert!(serde_json::from_str::<Radius>("7").is_err());
    }

    #[test]
    fn distance_display() {
        let mut s = sample_station("1", "Downtown Hub", "123 Main St");
        assert_eq!(s.distance_display(), "0.80 km");
        s.distance_km = None;
        assert_eq!(s.distance_display(), "?");
    }

    #[test]
    fn text_filter() {
        let stations = vec![
            sample_station("1", "Downtown Hub", "123 Main St, City Center"),
            sample_station("2", "Mall Station", "456 Shopping Ave"),
            sample_station("3", "Airport Terminal", "789 Airport Rd"),
        ];

        let hits = filter_stations(&stations, "MALL");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "2");

        let hits = filter_stations(&stations, "airport rd");
        assert_eq!(hits.len(), 1);

        assert_eq!(filter_stations(&stations, "").len(), 3);
        assert!(filter_stations(&stations, "nowhere").is_empty());
    }

    #[test]
    fn position_requires_both_coordinates() {
        let mut s = sample_station("1", "Hub", "Street");
        assert!(s.position().is_some());
        s.longitude = None;
        assert!(s.position().is_none());
    }
}
