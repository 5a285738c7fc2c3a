//! Map overlay model.
//!
//! Marker data for the station map. The page's Leaflet script reads it
//! as JSON; nothing here talks to a tile server.

use serde::Serialize;

use crate::domain::{Coordinates, StationStatus, StationSummary};

pub const DEFAULT_ZOOM: u8 = 13;
pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    User,
    Station,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub kind: MarkerKind,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    /// Popup text under the label.
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StationStatus>,
}

/// Everything the page needs to draw the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOverlay {
    pub center: [f64; 2],
    pub zoom: u8,
    pub tile_url: &'static str,
    pub attribution: &'static str,
    pub markers: Vec<Marker>,
}

impl MapOverlay {
    /// Build the overlay centred on the user.
    ///
    /// Stations without a usable position are left off the map; they
    /// still appear in the list.
    pub fn new<'a>(user: Coordinates, stations: impl IntoIterator<Item = &'a StationSummary>) -> Self {
        let mut markers = vec![Marker {
            kind: MarkerKind::User,
            latitude: user.latitude(),
            longitude: user.longitude(),
            label: "You are here".to_string(),
            detail: user.to_string(),
            station_id: None,
            status: None,
        }];

        markers.extend(stations.into_iter().filter_map(|station| {
            let position = station.position()?;
            Some(Marker {
                kind: MarkerKind::Station,
                latitude: position.latitude(),
                longitude: position.longitude(),
                label: station.name.clone(),
                detail: format!(
                    "{} · {}/{} available",
                    station.address,
                    station.capacity.available(),
                    station.capacity.total()
                ),
                station_id: Some(station.id.to_string()),
                status: Some(station.status),
            })
        }));

        Self {
            center: [user.latitude(), user.longitude()],
            zoom: DEFAULT_ZOOM,
            tile_url: OSM_TILE_URL,
            attribution: OSM_ATTRIBUTION,
            markers,
        }
    }

    pub fn station_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Station)
    }

    /// JSON for embedding in the page.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
