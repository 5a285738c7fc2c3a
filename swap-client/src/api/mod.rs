//! Swap-station REST API.
//!
//! The remote API owns all stations and bookings. This module provides
//! the HTTP client, its wire types, and the [`SwapApi`] trait that the
//! reservation and booking components are written against, so they can
//! be exercised without a server.

mod client;
mod error;
mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BookingId, Coordinates, Radius};

pub use client::{ApiClient, ApiConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use types::{
    ArriveRequest, BookingDto, CreateBookingRequest, LoginRequest, LoginResponse, NearbyBody,
    NumOrStr, PaymentLinkRequest, PaymentLinkResponse, SwapType, parse_timestamp,
};

/// Operations the front-end needs from the remote API.
#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Raw station records near `coords`, envelope already removed.
    async fn nearby_stations(
        &self,
        token: Option<&str>,
        coords: Coordinates,
        radius: Radius,
    ) -> Result<Vec<serde_json::Value>, ApiError>;

    /// Create a draft booking.
    async fn create_booking(
        &self,
        token: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingDto, ApiError>;

    /// Request a payment URL for a booking.
    async fn create_payment_link(
        &self,
        token: &str,
        booking: BookingId,
        request: &PaymentLinkRequest,
    ) -> Result<String, ApiError>;

    /// Read one booking.
    async fn get_booking(
        &self,
        token: &str,
        booking: BookingId,
    ) -> Result<BookingDto, ApiError>;

    /// Mark arrival. `None` means success with no usable body.
    async fn check_in(
        &self,
        token: &str,
        booking: BookingId,
        at: DateTime<Utc>,
    ) -> Result<Option<BookingDto>, ApiError>;

    /// Exchange credentials for a session.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
}

/// [`ApiClient`] bound to one payment gateway.
#[derive(Debug, Clone)]
pub struct RemoteApi {
    client: ApiClient,
    gateway: String,
}

impl RemoteApi {
    pub fn new(client: ApiClient, gateway: impl Into<String>) -> Self {
        Self {
            client,
            gateway: gateway.into(),
        }
    }
}

#[async_trait]
impl SwapApi for RemoteApi {
    async fn nearby_stations(
        &self,
        token: Option<&str>,
        coords: Coordinates,
        radius: Radius,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        self.client.nearby_stations(token, coords, radius).await
    }

    async fn create_booking(
        &self,
        token: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingDto, ApiError> {
        self.client.create_booking(token, request).await
    }

    async fn create_payment_link(
        &self,
        token: &str,
        booking: BookingId,
        request: &PaymentLinkRequest,
    ) -> Result<String, ApiError> {
        self.client
            .create_payment_link(token, booking, &self.gateway, request)
            .await
    }

    async fn get_booking(
        &self,
        token: &str,
        booking: BookingId,
    ) -> Result<BookingDto, ApiError> {
        self.client.get_booking(token, booking).await
    }

    async fn check_in(
        &self,
        token: &str,
        booking: BookingId,
        at: DateTime<Utc>,
    ) -> Result<Option<BookingDto>, ApiError> {
        let request = ArriveRequest {
            at: at.to_rfc3339(),
        };
        self.client.arrive(token, booking, &request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.client.login(request).await
    }
}

#[cfg(test)]
pub(crate) mod mock;
