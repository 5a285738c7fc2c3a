//! Geographic coordinates.

use std::fmt;

use serde::Serialize;

use super::error::DomainError;

/// A validated latitude/longitude pair in decimal degrees.
///
/// # Examples
///
/// ```
/// use swap_client::domain::Coordinates;
///
/// let hcm = Coordinates::new(10.75819, 106.65405).unwrap();
/// assert_eq!(hcm.latitude(), 10.75819);
///
/// // Out of range latitude is rejected
/// assert!(Coordinates::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Coordinates used when the device position cannot be obtained.
    pub const FALLBACK: Coordinates = Coordinates {
        latitude: 10.75819,
        longitude: 106.65405,
    };

    /// Create coordinates, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(DomainError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}
