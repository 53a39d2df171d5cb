//! Geographic coordinate value type.

use serde::Serialize;

use crate::CoreError;

/// A point on the globe in decimal degrees.
///
/// Construction through [`Coordinate::new`] guarantees latitude in `[-90, 90]`
/// and longitude in `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LatitudeOutOfRange`] or
    /// [`CoreError::LongitudeOutOfRange`] when a component is outside its range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses the decimal-string pair returned by geocoding services,
    /// e.g. `("52.5170365", "13.3888599")`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDecimal`] if either string is not a number,
    /// or a range error from [`Coordinate::new`].
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, CoreError> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::InvalidDecimal {
                field: "latitude",
                raw: latitude.to_string(),
            })?;
        let lon = longitude
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::InvalidDecimal {
                field: "longitude",
                raw: longitude.to_string(),
            })?;
        Self::new(lat, lon)
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}
