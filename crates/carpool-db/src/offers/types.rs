//! Row types for the `ride_offers` table.

use carpool_core::{Coordinate, Offer};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::DbError;

/// A row from the `ride_offers` table.
///
/// Coordinates are stored as `NUMERIC(10,7)`; a CHECK constraint keeps
/// `latitude` and `longitude` both set or both NULL.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub zip_code: String,
    pub city: String,
    pub street: Option<String>,
    pub last_name: String,
    pub first_name: Option<String>,
    pub email: String,
    pub class_name: Option<String>,
    pub phone: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub cost_info: Option<String>,
    pub additional_info: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub edit_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferRow {
    /// Converts the row into the domain type.
    ///
    /// A half-set coordinate pair (impossible under the table constraint) is
    /// read as "no coordinates".
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidCoordinate`] if the stored values are out of
    /// range.
    pub fn into_offer(self) -> Result<Offer, DbError> {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::parse(&lat.to_string(), &lon.to_string())?),
            (None, None) => None,
            _ => {
                tracing::warn!(offer_id = self.id, "offer has only one coordinate set; ignoring");
                None
            }
        };

        Ok(Offer {
            id: self.id,
            zip_code: self.zip_code,
            city: self.city,
            street: self.street,
            last_name: self.last_name,
            first_name: self.first_name,
            email: self.email,
            class_name: self.class_name,
            phone: self.phone,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            cost_info: self.cost_info,
            additional_info: self.additional_info,
            coordinates,
            edit_code: self.edit_code,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// One page of offers, newest first.
#[derive(Debug, Clone)]
pub struct OfferPage {
    pub items: Vec<Offer>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

pub(crate) fn rows_into_offers(rows: Vec<OfferRow>) -> Result<Vec<Offer>, DbError> {
    rows.into_iter().map(OfferRow::into_offer).collect()
}
