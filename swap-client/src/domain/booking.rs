//! Booking types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::station::StationId;

/// Numeric booking identifier assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookingId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BookingId)
    }
}

/// Booking lifecycle state.
///
/// ```text
/// CONFIRMED ──check-in──▶ CHECKED_IN
///     │
///     └──cancel──▶ CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    Confirmed,
    CheckedIn,
    Cancelled,
}

impl BookingState {
    /// Read a server status string.
    ///
    /// The server has intermediate states (pending payment, paid, ...) that
    /// the client does not distinguish; those all read as `Confirmed`.
    pub fn parse_lenient(s: &str) -> Self {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "CHECKED_IN" | "ARRIVED" | "CHECKEDIN" => BookingState::CheckedIn,
            "CANCELLED" | "CANCELED" => BookingState::Cancelled,
            _ => BookingState::Confirmed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Confirmed => "CONFIRMED",
            BookingState::CheckedIn => "CHECKED_IN",
            BookingState::Cancelled => "CANCELLED",
        }
    }

    /// Check whether `self → to` is a permitted transition.
    pub fn can_transition_to(&self, to: BookingState) -> bool {
        matches!(
            (self, to),
            (BookingState::Confirmed, BookingState::CheckedIn)
                | (BookingState::Confirmed, BookingState::Cancelled)
        )
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation, as last seen from the server.
///
/// The server is authoritative. The client only receives, persists and
/// displays its copy, and moves it to `CheckedIn` through check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    /// External order id sent to the payment gateway.
    pub order_id: String,
    pub station_id: StationId,
    pub station_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_hours: u32,
    /// Amount in the currency's minor units.
    amount: i64,
    pub payment_provider: Option<String>,
    /// Gateway transaction reference, once payment has gone through.
    pub transaction_ref: Option<String>,
    state: BookingState,
}

impl Booking {
    /// Create a booking, enforcing a non-negative amount.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BookingId,
        order_id: String,
        station_id: StationId,
        station_name: String,
        start_time: Option<DateTime<Utc>>,
        duration_hours: u32,
        amount: i64,
        state: BookingState,
    ) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::NegativeAmount(amount));
        }
        Ok(Self {
            id,
            order_id,
            station_id,
            station_name,
            start_time,
            duration_hours,
            amount,
            payment_provider: None,
            transaction_ref: None,
            state,
        })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    pub fn is_checked_in(&self) -> bool {
        self.state == BookingState::CheckedIn
    }

    /// Move to `CheckedIn`. Only valid from `Confirmed`.
    pub fn mark_checked_in(&mut self) -> Result<(), DomainError> {
        self.transition(BookingState::CheckedIn)
    }

    /// Move to `Cancelled`. Only valid from `Confirmed`.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(BookingState::Cancelled)
    }

    fn transition(&mut self, to: BookingState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_booking(id: u64, state: BookingState) -> Booking {
    Booking::new(
        BookingId(id),
        format!("ORD-{id}"),
        StationId::parse("7").unwrap(),
        "Downtown Hub".to_string(),
        None,
        1,
        25_000,
        state,
    )
    .unwrap()
}
