//! Write operations for the `ride_offers` table.

use carpool_core::{Coordinate, Offer, OfferFields};
use chrono::NaiveDate;
use rand::distr::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;

use super::types::OfferRow;
use crate::DbError;

/// Length of the secret code that grants edit access to an offer.
pub const EDIT_CODE_LEN: usize = 10;

const EDIT_CODE_ATTEMPTS: u32 = 5;
const EDIT_CODE_CONSTRAINT: &str = "ride_offers_edit_code_key";

fn generate_edit_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(EDIT_CODE_LEN)
        .map(char::from)
        .collect()
}

fn is_edit_code_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(EDIT_CODE_CONSTRAINT)
        }
        _ => false,
    }
}

/// Insert a new offer with a freshly generated edit code.
///
/// Missing validity dates default to `today` and six months after `today`.
/// Latitude and longitude are bound as `Option<f64>` and coerced to
/// `NUMERIC(10,7)` by the database.
///
/// # Errors
///
/// Returns [`DbError::EditCodeExhausted`] if every generated code collided,
/// or [`DbError::Sqlx`] if the insert fails for another reason.
pub async fn insert_offer(
    pool: &PgPool,
    fields: &OfferFields,
    coordinates: Option<Coordinate>,
    today: NaiveDate,
) -> Result<Offer, DbError> {
    let (valid_from, valid_until) = fields.validity_window(today);

    for attempt in 1..=EDIT_CODE_ATTEMPTS {
        let edit_code = generate_edit_code();
        let result = sqlx::query_as::<_, OfferRow>(concat!(
            "INSERT INTO ride_offers \
                 (zip_code, city, street, last_name, first_name, email, class_name, phone, \
                  valid_from, valid_until, cost_info, additional_info, latitude, longitude, \
                  edit_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING ",
            offer_columns!()
        ))
        .bind(&fields.zip_code)
        .bind(&fields.city)
        .bind(&fields.street)
        .bind(&fields.last_name)
        .bind(&fields.first_name)
        .bind(&fields.email)
        .bind(&fields.class_name)
        .bind(&fields.phone)
        .bind(valid_from)
        .bind(valid_until)
        .bind(&fields.cost_info)
        .bind(&fields.additional_info)
        .bind(coordinates.map(|c| c.latitude()))
        .bind(coordinates.map(|c| c.longitude()))
        .bind(&edit_code)
        .fetch_one(pool)
        .await;

        match result {
            Ok(row) => return row.into_offer(),
            Err(e) if is_edit_code_collision(&e) => {
                tracing::warn!(attempt, "edit code collision; regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(DbError::EditCodeExhausted {
        attempts: EDIT_CODE_ATTEMPTS,
    })
}

/// Replace the writable fields and coordinates of the offer holding
/// `edit_code`.
///
/// Validity dates left empty keep their stored value.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the code matches no offer, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_offer(
    pool: &PgPool,
    edit_code: &str,
    fields: &OfferFields,
    coordinates: Option<Coordinate>,
) -> Result<Offer, DbError> {
    sqlx::query_as::<_, OfferRow>(concat!(
        "UPDATE ride_offers SET \
             zip_code        = $2, \
             city            = $3, \
             street          = $4, \
             last_name       = $5, \
             first_name      = $6, \
             email           = $7, \
             class_name      = $8, \
             phone           = $9, \
             valid_from      = COALESCE($10, valid_from), \
             valid_until     = COALESCE($11, valid_until), \
             cost_info       = $12, \
             additional_info = $13, \
             latitude        = $14, \
             longitude       = $15, \
             updated_at      = NOW() \
         WHERE edit_code = $1 \
         RETURNING ",
        offer_columns!()
    ))
    .bind(edit_code)
    .bind(&fields.zip_code)
    .bind(&fields.city)
    .bind(&fields.street)
    .bind(&fields.last_name)
    .bind(&fields.first_name)
    .bind(&fields.email)
    .bind(&fields.class_name)
    .bind(&fields.phone)
    .bind(fields.valid_from)
    .bind(fields.valid_until)
    .bind(&fields.cost_info)
    .bind(&fields.additional_info)
    .bind(coordinates.map(|c| c.latitude()))
    .bind(coordinates.map(|c| c.longitude()))
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?
    .into_offer()
}

/// Delete the offer holding `edit_code`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the code matches no offer, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_offer(pool: &PgPool, edit_code: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM ride_offers WHERE edit_code = $1")
        .bind(edit_code)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_codes_are_ten_alphanumeric_chars() {
        for _ in 0..50 {
            let code = generate_edit_code();
            assert_eq!(code.len(), EDIT_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
        }
    }

    #[test]
    fn edit_codes_differ_between_calls() {
        assert_ne!(generate_edit_code(), generate_edit_code());
    }

    #[test]
    fn non_database_errors_are_not_collisions() {
        assert!(!is_edit_code_collision(&sqlx::Error::RowNotFound));
    }
}
