//! Askama templates for the web frontend.

use askama::Template;

use crate::domain::{Booking, BookingState, Radius, StationStatus, StationSummary};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Served while the browser works out where it is.
#[derive(Template)]
#[template(path = "locating.html")]
pub struct LocatingTemplate {
    pub radius: u32,
    pub query: String,
    pub timeout_ms: u64,
}

/// Nearby-station list with map.
#[derive(Template)]
#[template(path = "stations.html")]
pub struct StationsTemplate {
    pub user: Option<String>,
    pub coords: String,
    /// Shown when the fallback location is in use.
    pub advisory: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub radius: u32,
    pub radii: Vec<RadiusOption>,
    pub query: String,
    pub stations: Vec<StationCard>,
    /// Size of the unfiltered list.
    pub total: usize,
    pub map_json: String,
    /// Directory failure message; the page offers a retry.
    pub error: Option<String>,
}

impl StationsTemplate {
    /// Link that refetches the list for the same position and radius.
    pub fn retry_href(&self) -> String {
        format!(
            "/stations?lat={}&lng={}&radius={}&refresh=1",
            self.lat, self.lng, self.radius
        )
    }

    /// Link that asks the browser for its position again.
    pub fn relocate_href(&self) -> String {
        format!("/stations?radius={}", self.radius)
    }
}

/// Booking status and check-in.
#[derive(Template)]
#[template(path = "booking_status.html")]
pub struct BookingStatusTemplate {
    pub user: Option<String>,
    pub booking: BookingView,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "signin.html")]
pub struct SignInTemplate {
    pub next: String,
    pub user_name: String,
    pub error: Option<String>,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
    pub link_href: String,
    pub link_label: String,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Radius selector entry.
#[derive(Debug, Clone)]
pub struct RadiusOption {
    pub km: u32,
    pub label: String,
    pub selected: bool,
}

impl RadiusOption {
    pub fn all(current: Radius) -> Vec<Self> {
        Radius::ALL
            .into_iter()
            .map(|r| RadiusOption {
                km: r.km(),
                label: r.to_string(),
                selected: r == current,
            })
            .collect()
    }
}

/// One station card in the list.
#[derive(Debug, Clone)]
pub struct StationCard {
    pub id: String,
    pub name: String,
    pub address: String,
    pub available: u32,
    pub total: u32,
    pub status: String,
    pub status_label: String,
    pub price: u32,
    pub rating: String,
    pub distance: String,
    pub eta: String,
    /// Whether the Reserve button is enabled.
    pub reservable: bool,
    /// A reservation for this station is already running.
    pub in_flight: bool,
}

impl StationCard {
    pub fn from_summary(station: &StationSummary, in_flight: bool) -> Self {
        let status_label = match station.status {
            StationStatus::Open => "Open",
            StationStatus::Maintenance => "Maintenance",
            StationStatus::Closed => "Closed",
        };
        Self {
            id: station.id.to_string(),
            name: station.name.clone(),
            address: station.address.clone(),
            available: station.capacity.available(),
            total: station.capacity.total(),
            status: station.status.as_str().to_string(),
            status_label: status_label.to_string(),
            price: station.price,
            rating: format!("{:.1}", station.rating),
            distance: station.distance_display(),
            eta: station.eta.clone(),
            reservable: station.status.is_open() && !in_flight,
            in_flight,
        }
    }

    /// Fill level for the availability bar, 0 to 100.
    pub fn fill_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (u64::from(self.available) * 100 / u64::from(self.total)) as u32
    }
}

/// Booking view model.
#[derive(Debug, Clone)]
pub struct BookingView {
    pub id: u64,
    pub order_id: String,
    pub station_name: String,
    pub start_time: String,
    pub duration_hours: u32,
    pub amount: String,
    pub state: String,
    pub state_label: String,
    pub can_check_in: bool,
    pub payment_provider: Option<String>,
    pub transaction_ref: Option<String>,
}

impl BookingView {
    pub fn from_booking(booking: &Booking) -> Self {
        let state_label = match booking.state() {
            BookingState::Confirmed => "Confirmed",
            BookingState::CheckedIn => "Checked in",
            BookingState::Cancelled => "Cancelled",
        };
        Self {
            id: booking.id.0,
            order_id: booking.order_id.clone(),
            station_name: booking.station_name.clone(),
            start_time: booking
                .start_time
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "Not scheduled".to_string()),
            duration_hours: booking.duration_hours,
            amount: format_amount(booking.amount()),
            state: booking.state().as_str().to_lowercase(),
            state_label: state_label.to_string(),
            can_check_in: booking.state() == BookingState::Confirmed,
            payment_provider: booking.payment_provider.clone(),
            transaction_ref: booking.transaction_ref.clone(),
        }
    }
}

/// Group digits in threes, e.g. `25000` as `"25,000"`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
