//! Booking status viewer.
//!
//! Shows the booking the user just paid for and lets them check in on
//! arrival. The locally stored copy is preferred; the server is only
//! asked when the page names a different booking than the one on record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::{ApiError, SwapApi};
use crate::domain::{Booking, BookingId, BookingState, DomainError};
use crate::session::Session;
use crate::store::{BookingRecords, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("{}", not_found_message(.0))]
    BookingNotFound(Option<BookingId>),

    /// No session, or the server rejected it.
    #[error("sign-in required")]
    AuthRequired,

    #[error("could not load booking: {0}")]
    Fetch(ApiError),

    #[error(transparent)]
    CheckIn(ApiError),

    #[error("booking {0} is cancelled and cannot be checked in")]
    NotCheckInable(BookingId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid booking: {0}")]
    Domain(#[from] DomainError),
}

fn not_found_message(id: &Option<BookingId>) -> String {
    match id {
        Some(id) => format!("booking {id} not found"),
        None => "no booking to show".to_string(),
    }
}

/// Where a loaded booking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOrigin {
    /// The stored copy, no request made.
    Local,
    /// Fetched from the server and stored as current.
    Remote,
    /// The server fetch failed; this is the stored copy instead.
    LocalFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBooking {
    pub booking: Booking,
    pub origin: BookingOrigin,
}

pub struct BookingStatusViewer {
    api: Arc<dyn SwapApi>,
    session: Session,
    records: BookingRecords,
}

impl BookingStatusViewer {
    pub fn new(api: Arc<dyn SwapApi>, session: Session, records: BookingRecords) -> Self {
        Self {
            api,
            session,
            records,
        }
    }

    /// Load the booking to display.
    ///
    /// `hint` is the booking id from the page URL, typically set by the
    /// payment gateway's return redirect. Reading a booking from the server
    /// needs a session; without one this fails with
    /// [`StatusError::AuthRequired`] rather than falling back.
    pub async fn load(&self, hint: Option<BookingId>) -> Result<LoadedBooking, StatusError> {
        let local = self.records.current().await?;

        match (local, hint) {
            (Some(local), None) => Ok(LoadedBooking {
                booking: local,
                origin: BookingOrigin::Local,
            }),
            (Some(local), Some(id)) if local.id == id => Ok(LoadedBooking {
                booking: local,
                origin: BookingOrigin::Local,
            }),
            (Some(local), Some(id)) => match self.fetch(id).await {
                Ok(booking) => Ok(LoadedBooking {
                    booking,
                    origin: BookingOrigin::Remote,
                }),
                Err(StatusError::AuthRequired) => Err(StatusError::AuthRequired),
                Err(e) => {
                    warn!(
                        requested = %id,
                        shown = %local.id,
                        error = %e,
                        "could not fetch booking, showing stored copy"
                    );
                    Ok(LoadedBooking {
                        booking: local,
                        origin: BookingOrigin::LocalFallback,
                    })
                }
            },
            (None, Some(id)) => {
                let booking = self.fetch(id).await.map_err(|e| match e {
                    StatusError::AuthRequired => e,
                    other => {
                        debug!(booking = %id, error = %other, "booking fetch failed");
                        StatusError::BookingNotFound(Some(id))
                    }
                })?;
                Ok(LoadedBooking {
                    booking,
                    origin: BookingOrigin::Remote,
                })
            }
            (None, None) => Err(StatusError::BookingNotFound(None)),
        }
    }

    async fn token(&self) -> Result<String, StatusError> {
        self.session
            .token()
            .await?
            .ok_or(StatusError::AuthRequired)
    }

    async fn fetch(&self, id: BookingId) -> Result<Booking, StatusError> {
        let token = self.token().await?;
        let dto = self
            .api
            .get_booking(&token, id)
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => StatusError::AuthRequired,
                ApiError::BookingNotFound(id) => StatusError::BookingNotFound(Some(id)),
                other => StatusError::Fetch(other),
            })?;

        // Prefer the station name we already know when the server omits it
        let selected = self.records.selected_station().await.ok().flatten();
        let station = selected.as_ref().filter(|s| {
            dto.station_id
                .as_ref()
                .is_none_or(|raw| raw.to_text() == s.id.as_str())
        });
        let booking = dto.into_booking(station)?;
        self.records.save_current(&booking).await?;
        info!(booking = %booking.id, state = %booking.state(), "booking fetched");
        Ok(booking)
    }

    /// Check in to `booking`.
    ///
    /// Already checked-in bookings are returned as they are without a
    /// request. On failure the stored copy is left untouched.
    pub async fn check_in(&self, booking: &Booking) -> Result<Booking, StatusError> {
        match booking.state() {
            BookingState::CheckedIn => {
                debug!(booking = %booking.id, "already checked in");
                return Ok(booking.clone());
            }
            BookingState::Cancelled => return Err(StatusError::NotCheckInable(booking.id)),
            BookingState::Confirmed => {}
        }

        let token = self.token().await?;
        let reply = self
            .api
            .check_in(&token, booking.id, Utc::now())
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => StatusError::AuthRequired,
                other => StatusError::CheckIn(other),
            })?;

        let updated = match reply.map(|dto| dto.into_booking(None)) {
            Some(Ok(server)) if server.id == booking.id => server,
            other => {
                if let Some(Err(e)) = other {
                    debug!(booking = %booking.id, error = %e, "unusable check-in body");
                }
                let mut local = booking.clone();
                local.mark_checked_in()?;
                local
            }
        };

        self.records.save_current(&updated).await?;
        info!(booking = %updated.id, state = %updated.state(), "checked in");
        Ok(updated)
    }
}
