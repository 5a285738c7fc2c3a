//! Swap-station REST API client.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::domain::{BookingId, Coordinates, Radius};

use super::error::ApiError;
use super::types::{
    ArriveRequest, BookingDto, CreateBookingRequest, LoginRequest, LoginResponse, NearbyBody,
    PaymentLinkRequest, PaymentLinkResponse,
};

/// Default base URL for the swap-station API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for the API, without a trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create a new config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// HTTP client for the swap-station API.
///
/// Every call takes the session token explicitly; the client itself holds
/// no session state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authed(&self, request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `GET /api/stations/nearby?lat&lng&radiusKm`
    pub async fn nearby_stations(
        &self,
        token: Option<&str>,
        coords: Coordinates,
        radius: Radius,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let url = format!("{}/api/stations/nearby", self.base_url);
        debug!(%coords, %radius, "fetching nearby stations");

        let request = self.http.get(&url).query(&[
            ("lat", coords.latitude().to_string()),
            ("lng", coords.longitude().to_string()),
            ("radiusKm", radius.km().to_string()),
        ]);

        let response = self
            .authed(request, token)
            .send()
            .await
            .map_err(|_| ApiError::DirectoryUnavailable { status: None })?;
        let status = response.status();

        if !status.is_success() {
            return Err(ApiError::DirectoryUnavailable {
                status: Some(status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|_| ApiError::DirectoryUnavailable { status: None })?;

        let body: NearbyBody = serde_json::from_str(&body).map_err(|e| ApiError::Json {
            message: e.to_string(),
        })?;

        Ok(body.into_records())
    }

    /// `POST /api/bookings`
    pub async fn create_booking(
        &self,
        token: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingDto, ApiError> {
        let url = format!("{}/api/bookings", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(ApiError::AuthRequired);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::DraftCreationFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_json(&body)
    }

    /// `POST /api/bookings/{id}/{gateway}-qr`
    ///
    /// Returns the gateway payment URL.
    pub async fn create_payment_link(
        &self,
        token: &str,
        booking: BookingId,
        gateway: &str,
        request: &PaymentLinkRequest,
    ) -> Result<String, ApiError> {
        let url = format!("{}/api/bookings/{}/{}-qr", self.base_url, booking, gateway);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(ApiError::AuthRequired);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::PaymentLinkFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        payment_url(parse_json(&body)?, status.as_u16())
    }

    /// `GET /api/bookings/{id}`
    pub async fn get_booking(
        &self,
        token: &str,
        booking: BookingId,
    ) -> Result<BookingDto, ApiError> {
        let url = format!("{}/api/bookings/{}", self.base_url, booking);

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(ApiError::AuthRequired);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::BookingNotFound(booking));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        booking_body(&body, booking)
    }

    /// `POST /api/bookings/{id}/arrive`
    ///
    /// Returns `None` when the server answers success with an empty or
    /// non-JSON body.
    pub async fn arrive(
        &self,
        token: &str,
        booking: BookingId,
        request: &ArriveRequest,
    ) -> Result<Option<BookingDto>, ApiError> {
        let url = format!("{}/api/bookings/{}/arrive", self.base_url, booking);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(ApiError::AuthRequired);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::CheckInFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.unwrap_or_default();
        Ok(arrive_body(&body))
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/api/auth/login", self.base_url);

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(ApiError::AuthRequired);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_json(&body)
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Json {
        message: format!("{e} (body: {})", body.chars().take(200).collect::<String>()),
    })
}

/// The payment URL from a successful payment-link response.
fn payment_url(link: PaymentLinkResponse, status: u16) -> Result<String, ApiError> {
    link.payment_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::PaymentLinkFailed {
            status,
            message: "response carried no paymentUrl".to_string(),
        })
}

/// A booking read body; an empty or `null` body means the booking is gone.
fn booking_body(body: &str, booking: BookingId) -> Result<BookingDto, ApiError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ApiError::BookingNotFound(booking));
    }
    parse_json(trimmed)
}

/// A check-in body, when it is a JSON booking object at all.
fn arrive_body(body: &str) -> Option<BookingDto> {
    serde_json::from_str(body).ok()
}
