//! Reservation flow controller.
//!
//! Drives one reservation from a selected station to the payment
//! gateway: create a draft booking, persist it, request a payment link
//! and hand back the URL to redirect to.
//!
//! ```text
//! Idle ─▶ CreatingDraft ─▶ RequestingPaymentLink ─▶ Redirecting
//!   │           │                    │
//!   ▼           ▼                    ▼
//! RedirectSignIn            Failed(message) ─▶ Idle
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::{ApiError, CreateBookingRequest, PaymentLinkRequest, SwapApi, SwapType};
use crate::domain::{Booking, BookingId, DomainError, StationId, StationSummary};
use crate::session::Session;
use crate::store::{BookingRecords, StoreError};

/// Where a reservation attempt currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationState {
    Idle,
    CreatingDraft,
    RequestingPaymentLink,
    Redirecting,
    RedirectSignIn,
    Failed(String),
}

/// Successful end of a reservation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveOutcome {
    /// Send the user to the payment gateway.
    Redirect { url: String, booking: Booking },
    /// No usable session; send the user to sign in.
    SignInRequired,
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("a reservation for station {0} is already in progress")]
    InFlight(StationId),

    #[error(transparent)]
    Draft(ApiError),

    /// The draft exists on the server but no payment link was issued.
    #[error("booking {booking_id} was created but payment could not start: {source}")]
    PaymentLink {
        booking_id: BookingId,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("server returned an unusable booking: {0}")]
    Invalid(#[from] DomainError),
}

/// Settings for building payment requests.
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    /// Base URL of this front-end; the gateway returns the user here.
    pub return_base_url: String,
    pub order_type: String,
    pub language: String,
}

impl ReservationConfig {
    pub fn new(return_base_url: impl Into<String>) -> Self {
        Self {
            return_base_url: return_base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Where the gateway sends the user after paying for `booking`.
    pub fn return_url(&self, booking: BookingId) -> String {
        format!("{}/booking/status?bookingId={}", self.return_base_url, booking)
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            return_base_url: "http://127.0.0.1:3000".to_string(),
            order_type: "other".to_string(),
            language: "vn".to_string(),
        }
    }
}

/// Runs reservation attempts, at most one per station at a time.
pub struct ReservationFlow {
    api: Arc<dyn SwapApi>,
    session: Session,
    records: BookingRecords,
    config: ReservationConfig,
    states: Mutex<HashMap<StationId, ReservationState>>,
}

/// Releases a station's in-flight slot when the attempt ends.
struct InFlightGuard<'a> {
    flow: &'a ReservationFlow,
    station: StationId,
}

impl InFlightGuard<'_> {
    fn set(&self, state: ReservationState) {
        debug!(station = %self.station, ?state, "reservation state");
        if let Ok(mut states) = self.flow.states.lock() {
            states.insert(self.station.clone(), state);
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut states) = self.flow.states.lock() {
            states.remove(&self.station);
        }
        debug!(station = %self.station, state = ?ReservationState::Idle, "reservation state");
    }
}

impl ReservationFlow {
    pub fn new(
        api: Arc<dyn SwapApi>,
        session: Session,
        records: BookingRecords,
        config: ReservationConfig,
    ) -> Self {
        Self {
            api,
            session,
            records,
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Current state of the attempt for `station`; `Idle` when none runs.
    pub fn state(&self, station: &StationId) -> ReservationState {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(station).cloned())
            .unwrap_or(ReservationState::Idle)
    }

    pub fn is_in_flight(&self, station: &StationId) -> bool {
        self.state(station) != ReservationState::Idle
    }

    fn begin(&self, station: &StationId) -> Result<InFlightGuard<'_>, ReservationError> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| ReservationError::InFlight(station.clone()))?;
        if states.contains_key(station) {
            return Err(ReservationError::InFlight(station.clone()));
        }
        states.insert(station.clone(), ReservationState::Idle);
        Ok(InFlightGuard {
            flow: self,
            station: station.clone(),
        })
    }

    /// Reserve a swap at `station`.
    ///
    /// The draft booking is persisted as the current booking before the
    /// payment link is requested, so a payment failure never loses it.
    pub async fn reserve(
        &self,
        station: &StationSummary,
    ) -> Result<ReserveOutcome, ReservationError> {
        let guard = self.begin(&station.id)?;

        let result = self.run(&guard, station).await;
        if let Err(e) = &result {
            // The slot is released right after, so this state is only logged
            let state = ReservationState::Failed(e.to_string());
            debug!(station = %station.id, ?state, "reservation state");
        }
        result
    }

    async fn run(
        &self,
        guard: &InFlightGuard<'_>,
        station: &StationSummary,
    ) -> Result<ReserveOutcome, ReservationError> {
        let Some(token) = self.session.token().await? else {
            guard.set(ReservationState::RedirectSignIn);
            info!(station = %station.id, "reservation needs sign-in");
            return Ok(ReserveOutcome::SignInRequired);
        };

        guard.set(ReservationState::CreatingDraft);
        let request = CreateBookingRequest {
            station_id: station.id.to_string(),
            expected_time: Utc::now().to_rfc3339(),
            swap_type: SwapType::Full,
        };
        let draft = match self.api.create_booking(&token, &request).await {
            Ok(dto) => dto,
            Err(ApiError::AuthRequired) => {
                guard.set(ReservationState::RedirectSignIn);
                info!(station = %station.id, "session rejected, reservation needs sign-in");
                return Ok(ReserveOutcome::SignInRequired);
            }
            Err(e) => return Err(ReservationError::Draft(e)),
        };

        let booking = draft.into_booking(Some(station))?;
        self.records.save_current(&booking).await?;
        self.records.select_station(station).await?;
        info!(booking = %booking.id, station = %station.id, "draft booking created");

        guard.set(ReservationState::RequestingPaymentLink);
        let payment = PaymentLinkRequest {
            order_id: booking.order_id.clone(),
            amount: booking.amount(),
            order_description: format!("Battery swap at {}", booking.station_name),
            return_url: self.config.return_url(booking.id),
            order_type: self.config.order_type.clone(),
            language: self.config.language.clone(),
        };
        let url = match self
            .api
            .create_payment_link(&token, booking.id, &payment)
            .await
        {
            Ok(url) => url,
            Err(source) => {
                warn!(
                    booking = %booking.id,
                    error = %source,
                    "payment link failed, draft booking left for reconciliation"
                );
                if let Err(e) = self.records.record_orphan(booking.id).await {
                    warn!(booking = %booking.id, error = %e, "could not record orphaned draft");
                }
                return Err(ReservationError::PaymentLink {
                    booking_id: booking.id,
                    source,
                });
            }
        };

        guard.set(ReservationState::Redirecting);
        info!(booking = %booking.id, "redirecting to payment");
        Ok(ReserveOutcome::Redirect { url, booking })
    }
}
