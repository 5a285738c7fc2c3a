//! Application state for the web layer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::api::SwapApi;
use crate::config::AppConfig;
use crate::directory::{NearbyStations, StationDirectory};
use crate::reservation::ReservationFlow;
use crate::session::Session;
use crate::status::BookingStatusViewer;
use crate::store::{BookingRecords, Store};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Remote swap-station API
    pub api: Arc<dyn SwapApi>,

    pub session: Session,

    pub records: BookingRecords,

    pub directory: StationDirectory,

    pub reservations: Arc<ReservationFlow>,

    pub status: Arc<BookingStatusViewer>,

    /// Time allowed for the browser to report a position
    pub geo_timeout: Duration,

    /// The list shown by the last stations page; the reserve route looks
    /// stations up here and text filtering reuses it
    pub nearby: Arc<RwLock<Option<NearbyStations>>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(api: Arc<dyn SwapApi>, store: Arc<Store>, config: &AppConfig) -> Self {
        let session = Session::new(store.clone());
        let records = BookingRecords::new(store);
        Self {
            directory: StationDirectory::new(api.clone(), session.clone()),
            reservations: Arc::new(ReservationFlow::new(
                api.clone(),
                session.clone(),
                records.clone(),
                config.reservation_config(),
            )),
            status: Arc::new(BookingStatusViewer::new(
                api.clone(),
                session.clone(),
                records.clone(),
            )),
            geo_timeout: config.geo_timeout(),
            nearby: Arc::new(RwLock::new(None)),
            api,
            session,
            records,
        }
    }
}
