//! Geolocation provider.
//!
//! Wraps a device location source with a fixed fallback. Acquisition
//! never fails: when the source is denied, times out or is unsupported,
//! the provider answers with [`Coordinates::FALLBACK`] plus an advisory
//! message for the user.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::Coordinates;

/// Default time allowed for a location fix.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a device location could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location request timed out")]
    Timeout,

    #[error("location not supported")]
    Unsupported,
}

impl LocationError {
    /// Message shown to the user when the fallback is used.
    pub fn advisory(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location access was denied. Showing stations near the default location."
            }
            LocationError::Timeout => {
                "Your location could not be determined in time. Showing stations near the default location."
            }
            LocationError::Unsupported => {
                "Location is not available on this device. Showing stations near the default location."
            }
        }
    }
}

/// Something that can report the device position.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Position as reported by the browser page.
///
/// The page runs the browser geolocation query and passes either the
/// coordinates or the failure reason back as query parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrowserReport {
    Position(Coordinates),
    Failed(LocationError),
}

impl BrowserReport {
    /// Interpret the `lat`, `lng` and `geo` query parameters.
    ///
    /// Returns `None` when the page has not reported anything yet.
    pub fn from_query(lat: Option<f64>, lng: Option<f64>, geo: Option<&str>) -> Option<Self> {
        if let (Some(lat), Some(lng)) = (lat, lng) {
            return Some(match Coordinates::new(lat, lng) {
                Ok(coords) => BrowserReport::Position(coords),
                Err(_) => BrowserReport::Failed(LocationError::Unsupported),
            });
        }

        let reason = match geo?.trim().to_ascii_lowercase().as_str() {
            "denied" => LocationError::PermissionDenied,
            "timeout" => LocationError::Timeout,
            _ => LocationError::Unsupported,
        };
        Some(BrowserReport::Failed(reason))
    }
}

#[async_trait]
impl LocationSource for BrowserReport {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        match self {
            BrowserReport::Position(coords) => Ok(*coords),
            BrowserReport::Failed(reason) => Err(*reason),
        }
    }
}

/// Result of one acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub coords: Coordinates,
    /// Set when the fallback was used.
    pub advisory: Option<String>,
}

impl Located {
    pub fn is_fallback(&self) -> bool {
        self.advisory.is_some()
    }
}

/// Geolocation with fallback and explicit retry.
///
/// Holds the last acquisition; nothing is shared between providers, so
/// every page load starts from scratch.
pub struct GeolocationProvider<S> {
    source: S,
    timeout: Duration,
    current: Option<Located>,
}

impl<S: LocationSource> GeolocationProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            timeout: DEFAULT_TIMEOUT,
            current: None,
        }
    }

    /// Set the time allowed for a location fix.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Acquire the position once. Later calls return the same result
    /// until [`refresh`](Self::refresh) is called.
    pub async fn acquire(&mut self) -> Located {
        if let Some(located) = &self.current {
            return located.clone();
        }
        self.refresh().await
    }

    /// Query the source again, replacing the previous result.
    pub async fn refresh(&mut self) -> Located {
        let located = match tokio::time::timeout(self.timeout, self.source.locate()).await {
            Ok(Ok(coords)) => {
                debug!(%coords, "device location acquired");
                Located {
                    coords,
                    advisory: None,
                }
            }
            Ok(Err(reason)) => fallback(reason),
            Err(_) => fallback(LocationError::Timeout),
        };
        self.current = Some(located.clone());
        located
    }

    pub fn current(&self) -> Option<&Located> {
        self.current.as_ref()
    }
}

fn fallback(reason: LocationError) -> Located {
    warn!(%reason, coords = %Coordinates::FALLBACK, "using fallback location");
    Located {
        coords: Coordinates::FALLBACK,
        advisory: Some(reason.advisory().to_string()),
    }
}
