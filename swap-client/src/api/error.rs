//! Remote API error types.

use crate::domain::{BookingId, DomainError};

/// Errors that can occur when talking to the swap-station API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No session token, or the server rejected it
    #[error("sign-in required")]
    AuthRequired,

    /// Nearby-station lookup failed
    #[error("station directory unavailable{}", status_suffix(.status))]
    DirectoryUnavailable { status: Option<u16> },

    /// Booking draft was not created
    #[error("could not create booking (status {status}): {message}")]
    DraftCreationFailed { status: u16, message: String },

    /// Payment link was not issued
    #[error("could not create payment link (status {status}): {message}")]
    PaymentLinkFailed { status: u16, message: String },

    /// Booking does not exist on the server
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    /// Check-in was rejected
    #[error("check-in failed (status {status}): {message}")]
    CheckInFailed { status: u16, message: String },

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Server record failed validation
    #[error("invalid record: {0}")]
    Invalid(#[from] DomainError),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}
