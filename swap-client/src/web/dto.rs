//! Request types for the web layer.

use serde::Deserialize;

use crate::domain::{BookingId, Radius};

/// Query for `GET /stations`.
///
/// `lat`/`lng` or `geo` are filled in by the page's geolocation script;
/// when neither is present the locating page is served first.
#[derive(Debug, Default, Deserialize)]
pub struct StationsQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub geo: Option<String>,
    pub radius: Option<u32>,
    #[serde(default)]
    pub q: String,
    /// Any value forces a fresh directory fetch.
    pub refresh: Option<String>,
}

impl StationsQuery {
    /// The requested radius; unsupported values fall back to the default.
    pub fn radius(&self) -> Radius {
        self.radius
            .and_then(|km| Radius::from_km(km).ok())
            .unwrap_or_default()
    }

    pub fn wants_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

/// Query for `GET /booking/status`.
#[derive(Debug, Default, Deserialize)]
pub struct BookingStatusQuery {
    #[serde(rename = "bookingId")]
    pub booking_id: Option<String>,
}

impl BookingStatusQuery {
    /// The booking id hint. Blank or non-numeric values count as absent.
    pub fn hint(&self) -> Option<BookingId> {
        self.booking_id.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    pub next: Option<String>,
}

/// Body of `POST /signin`.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub user_name: String,
    pub password: String,
    pub next: Option<String>,
}

/// Where to go after signing in.
///
/// Only local paths are honoured so the form cannot be used to bounce the
/// user to another site.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/stations".to_string(),
    }
}
