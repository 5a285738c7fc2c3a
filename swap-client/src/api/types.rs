//! Wire types for the swap-station API.
//!
//! The server is loosely specified: ids arrive as numbers or strings,
//! field names vary between endpoints, and lists come either bare or
//! wrapped in a page envelope. These types accept all of that and leave
//! validation to the conversion into domain types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Booking, BookingId, BookingState, DomainError, StationId, StationSummary,
};

/// A JSON scalar that may be sent as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumOrStr {
    Num(serde_json::Number),
    Str(String),
}

impl NumOrStr {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumOrStr::Num(n) => n.as_f64(),
            NumOrStr::Str(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NumOrStr::Num(n) => n.as_u64(),
            NumOrStr::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Text form; numbers are printed without a trailing `.0`.
    pub fn to_text(&self) -> String {
        match self {
            NumOrStr::Num(n) => match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            },
            NumOrStr::Str(s) => s.trim().to_string(),
        }
    }
}

impl From<u64> for NumOrStr {
    fn from(n: u64) -> Self {
        NumOrStr::Num(n.into())
    }
}

impl From<&str> for NumOrStr {
    fn from(s: &str) -> Self {
        NumOrStr::Str(s.to_string())
    }
}

/// Body of the nearby-station lookup: a bare list or a page envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NearbyBody {
    List(Vec<serde_json::Value>),
    Envelope { content: Vec<serde_json::Value> },
}

impl NearbyBody {
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            NearbyBody::List(records) => records,
            NearbyBody::Envelope { content } => content,
        }
    }
}

/// Booking object as returned by the booking endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    #[serde(alias = "bookingId", alias = "bookingID")]
    pub id: Option<NumOrStr>,
    pub order_id: Option<NumOrStr>,
    #[serde(alias = "stationID")]
    pub station_id: Option<NumOrStr>,
    pub station_name: Option<String>,
    #[serde(alias = "expectedTime")]
    pub start_time: Option<String>,
    pub duration_hours: Option<NumOrStr>,
    #[serde(alias = "amount")]
    pub total_price: Option<NumOrStr>,
    #[serde(alias = "paymentMethod")]
    pub payment_provider: Option<String>,
    #[serde(alias = "transactionNo")]
    pub transaction_ref: Option<String>,
    #[serde(alias = "bookingStatus")]
    pub status: Option<String>,
}

impl BookingDto {
    /// Convert into a domain booking.
    ///
    /// `station` is the station the booking was made for, when known. It
    /// fills in a missing station id or name, and a booking that names a
    /// different station is rejected.
    pub fn into_booking(self, station: Option<&StationSummary>) -> Result<Booking, DomainError> {
        let id = self
            .id
            .as_ref()
            .and_then(NumOrStr::as_u64)
            .map(BookingId)
            .ok_or(DomainError::MissingField("id"))?;

        let station_id = match (self.station_id.as_ref(), station) {
            (Some(raw), Some(expected)) => {
                let found = StationId::parse(&raw.to_text())?;
                if found != expected.id {
                    return Err(DomainError::StationMismatch {
                        expected: expected.id.clone(),
                        found,
                    });
                }
                found
            }
            (Some(raw), None) => StationId::parse(&raw.to_text())?,
            (None, Some(expected)) => expected.id.clone(),
            (None, None) => return Err(DomainError::MissingStation),
        };

        let station_name = self
            .station_name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| station.map(|s| s.name.clone()))
            .unwrap_or_else(|| format!("Station {station_id}"));

        let amount = self
            .total_price
            .as_ref()
            .and_then(NumOrStr::as_f64)
            .map(|p| p.round() as i64)
            .unwrap_or(0);

        let order_id = self
            .order_id
            .as_ref()
            .map(NumOrStr::to_text)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| id.to_string());

        // Partial hours round up; anything unreadable means one hour
        let duration_hours = self
            .duration_hours
            .as_ref()
            .and_then(NumOrStr::as_f64)
            .filter(|h| h.is_finite() && *h > 0.0)
            .map(|h| h.ceil().min(f64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        let state = self
            .status
            .as_deref()
            .map(BookingState::parse_lenient)
            .unwrap_or(BookingState::Confirmed);

        let mut booking = Booking::new(
            id,
            order_id,
            station_id,
            station_name,
            self.start_time.as_deref().and_then(parse_timestamp),
            duration_hours,
            amount,
            state,
        )?;
        booking.payment_provider = self.payment_provider;
        booking.transaction_ref = self.transaction_ref;
        Ok(booking)
    }
}

impl From<&Booking> for BookingDto {
    fn from(b: &Booking) -> Self {
        Self {
            id: Some(b.id.0.into()),
            order_id: Some(b.order_id.as_str().into()),
            station_id: Some(b.station_id.as_str().into()),
            station_name: Some(b.station_name.clone()),
            start_time: b.start_time.map(|t| t.to_rfc3339()),
            duration_hours: Some(u64::from(b.duration_hours).into()),
            total_price: Some(NumOrStr::Num(b.amount().into())),
            payment_provider: b.payment_provider.clone(),
            transaction_ref: b.transaction_ref.clone(),
            status: Some(b.state().as_str().to_string()),
        }
    }
}

/// Parse a server timestamp: RFC 3339, or a naive local timestamp read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Kind of swap requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapType {
    Full,
}

/// Body for `POST /api/bookings`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub station_id: String,
    pub expected_time: String,
    pub swap_type: SwapType,
}

/// Body for `POST /api/bookings/{id}/{gateway}-qr`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkRequest {
    pub order_id: String,
    pub amount: i64,
    pub order_description: String,
    pub return_url: String,
    pub order_type: String,
    pub language: String,
}

/// Response of the payment-link endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkResponse {
    pub payment_url: Option<String>,
}

/// Body for `POST /api/bookings/{id}/arrive`.
#[derive(Debug, Clone, Serialize)]
pub struct ArriveRequest {
    pub at: String,
}

/// Body for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

/// Response of the login endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Option<String>,
    #[serde(alias = "username")]
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}
