//! Nominatim `/search` response types and the suggestion shape served to
//! address autocomplete.

use carpool_core::Coordinate;
use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

/// One entry of a Nominatim `/search?format=json` response.
///
/// Nominatim encodes coordinates as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
    /// Only present when the request sets `addressdetails=1`.
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

impl NominatimPlace {
    /// Parses the place's decimal-string coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidCoordinate`] when `lat`/`lon` are not
    /// numbers or out of range.
    pub fn coordinate(&self) -> Result<Coordinate, GeocodeError> {
        Ok(Coordinate::parse(&self.lat, &self.lon)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    pub road: Option<String>,
    pub house_number: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub postcode: Option<String>,
}

impl NominatimAddress {
    /// `"<road> <house_number>"`, just the road, or empty when there is no road.
    #[must_use]
    pub fn street_line(&self) -> String {
        match (&self.road, &self.house_number) {
            (Some(road), Some(number)) => format!("{road} {number}"),
            (Some(road), None) => road.clone(),
            (None, _) => String::new(),
        }
    }

    /// The most specific settlement name Nominatim returned.
    #[must_use]
    pub fn locality(&self) -> String {
        self.city
            .as_ref()
            .or(self.town.as_ref())
            .or(self.village.as_ref())
            .or(self.municipality.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// An autocomplete candidate for the offer form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressSuggestion {
    pub display_name: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl AddressSuggestion {
    /// Builds a suggestion from a Nominatim place.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidCoordinate`] if the place's coordinates
    /// do not parse.
    pub fn from_place(place: &NominatimPlace) -> Result<Self, GeocodeError> {
        let coordinate = place.coordinate()?;
        let address = place.address.clone().unwrap_or_default();
        Ok(Self {
            display_name: place.display_name.clone(),
            street: address.street_line(),
            city: address.locality(),
            zip_code: address.postcode.clone().unwrap_or_default(),
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
        })
    }
}
