//! In-memory API used by component tests.
//!
//! Serves canned responses and records every call so tests can assert on
//! exactly which requests were issued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::domain::{BookingId, Coordinates, Radius};

use super::{
    ApiError, BookingDto, CreateBookingRequest, LoginRequest, LoginResponse, PaymentLinkRequest,
    SwapApi,
};

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Nearby { radius: Radius, token: Option<String> },
    CreateBooking { station_id: String },
    PaymentLink { booking: BookingId, amount: i64 },
    GetBooking(BookingId),
    CheckIn(BookingId),
    Login,
}

/// How the mock answers a check-in.
#[derive(Debug, Clone)]
pub enum CheckInReply {
    Booking(BookingDto),
    Empty,
    Fail(u16),
}

struct MockState {
    nearby: Result<Vec<serde_json::Value>, u16>,
    draft: Option<BookingDto>,
    payment_url: Option<String>,
    bookings: HashMap<BookingId, BookingDto>,
    check_in: CheckInReply,
    login: Option<LoginResponse>,
}

pub struct MockApi {
    state: Mutex<MockState>,
    calls: Mutex<Vec<MockCall>>,
    /// When set, each nearby lookup waits for one permit after recording.
    nearby_gate: Option<Arc<Notify>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                nearby: Ok(Vec::new()),
                draft: None,
                payment_url: None,
                bookings: HashMap::new(),
                check_in: CheckInReply::Empty,
                login: None,
            }),
            calls: Mutex::new(Vec::new()),
            nearby_gate: None,
        }
    }

    pub fn with_nearby(self, records: Vec<serde_json::Value>) -> Self {
        self.state.lock().unwrap().nearby = Ok(records);
        self
    }

    pub fn with_nearby_failure(self, status: u16) -> Self {
        self.state.lock().unwrap().nearby = Err(status);
        self
    }

    pub fn with_nearby_gate(mut self, gate: Arc<Notify>) -> Self {
        self.nearby_gate = Some(gate);
        self
    }

    pub fn with_draft(self, dto: BookingDto) -> Self {
        self.state.lock().unwrap().draft = Some(dto);
        self
    }

    pub fn with_payment_url(self, url: &str) -> Self {
        self.state.lock().unwrap().payment_url = Some(url.to_string());
        self
    }

    pub fn with_booking(self, dto: BookingDto) -> Self {
        let id = dto
            .id
            .as_ref()
            .and_then(|n| n.as_u64())
            .map(BookingId)
            .expect("mock booking needs an id");
        self.state.lock().unwrap().bookings.insert(id, dto);
        self
    }

    pub fn with_check_in(self, reply: CheckInReply) -> Self {
        self.state.lock().unwrap().check_in = reply;
        self
    }

    pub fn with_login(self, response: LoginResponse) -> Self {
        self.state.lock().unwrap().login = Some(response);
        self
    }

    pub fn set_nearby(&self, records: Vec<serde_json::Value>) {
        self.state.lock().unwrap().nearby = Ok(records);
    }

    pub fn set_nearby_failure(&self, status: u16) {
        self.state.lock().unwrap().nearby = Err(status);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SwapApi for MockApi {
    async fn nearby_stations(
        &self,
        token: Option<&str>,
        _coords: Coordinates,
        radius: Radius,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        self.record(MockCall::Nearby {
            radius,
            token: token.map(str::to_string),
        });
        if let Some(gate) = &self.nearby_gate {
            gate.notified().await;
        }
        match &self.state.lock().unwrap().nearby {
            Ok(records) => Ok(records.clone()),
            Err(status) => Err(ApiError::DirectoryUnavailable {
                status: Some(*status),
            }),
        }
    }

    async fn create_booking(
        &self,
        _token: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingDto, ApiError> {
        self.record(MockCall::CreateBooking {
            station_id: request.station_id.clone(),
        });
        self.state
            .lock()
            .unwrap()
            .draft
            .clone()
            .ok_or_else(|| ApiError::DraftCreationFailed {
                status: 500,
                message: "draft rejected".to_string(),
            })
    }

    async fn create_payment_link(
        &self,
        _token: &str,
        booking: BookingId,
        request: &PaymentLinkRequest,
    ) -> Result<String, ApiError> {
        self.record(MockCall::PaymentLink {
            booking,
            amount: request.amount,
        });
        self.state
            .lock()
            .unwrap()
            .payment_url
            .clone()
            .ok_or_else(|| ApiError::PaymentLinkFailed {
                status: 502,
                message: "gateway down".to_string(),
            })
    }

    async fn get_booking(
        &self,
        _token: &str,
        booking: BookingId,
    ) -> Result<BookingDto, ApiError> {
        self.record(MockCall::GetBooking(booking));
        self.state
            .lock()
            .unwrap()
            .bookings
            .get(&booking)
            .cloned()
            .ok_or(ApiError::BookingNotFound(booking))
    }

    async fn check_in(
        &self,
        _token: &str,
        booking: BookingId,
        _at: DateTime<Utc>,
    ) -> Result<Option<BookingDto>, ApiError> {
        self.record(MockCall::CheckIn(booking));
        match self.state.lock().unwrap().check_in.clone() {
            CheckInReply::Booking(dto) => Ok(Some(dto)),
            CheckInReply::Empty => Ok(None),
            CheckInReply::Fail(401 | 403) => Err(ApiError::AuthRequired),
            CheckInReply::Fail(status) => Err(ApiError::CheckInFailed {
                status,
                message: "rejected".to_string(),
            }),
        }
    }

    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.record(MockCall::Login);
        self.state
            .lock()
            .unwrap()
            .login
            .clone()
            .ok_or(ApiError::AuthRequired)
    }
}
