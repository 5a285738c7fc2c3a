//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from API/IO errors.

use super::{BookingState, StationId};

/// Domain-level errors for validation and state transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Latitude or longitude outside the valid range
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Radius is not one of the supported candidates
    #[error("unsupported radius {0} km (expected 2, 5, 10 or 20)")]
    InvalidRadius(u32),

    /// Station identifiers must be non-empty
    #[error("station id must not be empty")]
    EmptyStationId,

    /// Booking amount below zero
    #[error("booking amount must not be negative (got {0})")]
    NegativeAmount(i64),

    /// A required field was absent from a server record
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Booking state change not permitted
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingState, to: BookingState },

    /// Booking references no station
    #[error("booking does not reference a station")]
    MissingStation,

    /// Station id on a booking does not match the station it was made for
    #[error("booking references station {found}, expected {expected}")]
    StationMismatch { expected: StationId, found: StationId },
}
