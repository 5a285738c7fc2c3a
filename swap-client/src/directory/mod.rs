//! Station directory client.
//!
//! Looks up stations near a position and turns the server's records into
//! [`StationSummary`] rows. A radius change always refetches the whole
//! list; text filtering is local and never touches the network.

mod normalize;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiError, SwapApi};
use crate::domain::{Coordinates, Radius, StationId, StationSummary, filter_stations};
use crate::session::Session;

pub use normalize::{
    DEFAULT_ETA, DEFAULT_NAME, DEFAULT_PRICE, DEFAULT_RATING, Normalized, normalize_record,
};

/// One fetched nearby-station list.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStations {
    pub coords: Coordinates,
    pub radius: Radius,
    pub stations: Vec<StationSummary>,
    /// Number of fields across all records that were filled with defaults.
    pub defaulted_fields: usize,
}

impl NearbyStations {
    /// Stations whose name or address contains `query`, ignoring case.
    pub fn filter(&self, query: &str) -> Vec<&StationSummary> {
        filter_stations(&self.stations, query)
    }

    pub fn find(&self, id: &StationId) -> Option<&StationSummary> {
        self.stations.iter().find(|s| &s.id == id)
    }
}

/// Client for the nearby-station directory.
#[derive(Clone)]
pub struct StationDirectory {
    api: Arc<dyn SwapApi>,
    session: Session,
}

impl StationDirectory {
    pub fn new(api: Arc<dyn SwapApi>, session: Session) -> Self {
        Self { api, session }
    }

    /// Fetch stations within `radius` of `coords`.
    ///
    /// Sends the session token when there is one. A non-success response
    /// fails with [`ApiError::DirectoryUnavailable`].
    pub async fn fetch_nearby(
        &self,
        coords: Coordinates,
        radius: Radius,
    ) -> Result<NearbyStations, ApiError> {
        let token = match self.session.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read session, fetching stations anonymously");
                None
            }
        };

        let records = self
            .api
            .nearby_stations(token.as_deref(), coords, radius)
            .await?;

        let mut defaulted_fields = 0;
        let stations: Vec<StationSummary> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let normalized = normalize_record(index, record);
                if !normalized.defaulted.is_empty() {
                    debug!(
                        station = %normalized.station.id,
                        fields = ?normalized.defaulted,
                        "station record had missing fields"
                    );
                }
                defaulted_fields += normalized.defaulted.len();
                normalized.station
            })
            .collect();

        if defaulted_fields > 0 {
            info!(
                defaulted_fields,
                records = stations.len(),
                "directory records relied on default values"
            );
        }

        Ok(NearbyStations {
            coords,
            radius,
            stations,
            defaulted_fields,
        })
    }

    /// Refetch `current` with a new radius, replacing it wholesale.
    ///
    /// On failure `current` is left as it was.
    pub async fn change_radius(
        &self,
        current: &mut NearbyStations,
        radius: Radius,
    ) -> Result<(), ApiError> {
        let fresh = self.fetch_nearby(current.coords, radius).await?;
        *current = fresh;
        Ok(())
    }
}
