//! Read operations for the `ride_offers` table.

use carpool_core::Offer;
use sqlx::PgPool;

use super::types::{rows_into_offers, OfferPage, OfferRow};
use crate::DbError;

/// Offers shown per listing page.
pub const OFFERS_PER_PAGE: u32 = 10;

/// Fetch one offer by its numeric id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no offer has this id, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_offer(pool: &PgPool, id: i64) -> Result<Offer, DbError> {
    sqlx::query_as::<_, OfferRow>(concat!(
        "SELECT ",
        offer_columns!(),
        " FROM ride_offers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?
    .into_offer()
}

/// Fetch one offer by its edit code.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the code matches no offer, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_offer_by_edit_code(pool: &PgPool, edit_code: &str) -> Result<Offer, DbError> {
    sqlx::query_as::<_, OfferRow>(concat!(
        "SELECT ",
        offer_columns!(),
        " FROM ride_offers WHERE edit_code = $1"
    ))
    .bind(edit_code)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?
    .into_offer()
}

/// List one page of offers, newest first.
///
/// `page` is 1-based; `0` is treated as `1`. A page past the end yields an
/// empty `items` list with the real `total`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_offers_page(pool: &PgPool, page: u32) -> Result<OfferPage, DbError> {
    let page = page.max(1);
    let offset = i64::from(page - 1) * i64::from(OFFERS_PER_PAGE);

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ride_offers")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, OfferRow>(concat!(
        "SELECT ",
        offer_columns!(),
        " FROM ride_offers ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(i64::from(OFFERS_PER_PAGE))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(OfferPage {
        items: rows_into_offers(rows)?,
        page,
        per_page: OFFERS_PER_PAGE,
        total,
    })
}

/// All offers with coordinates, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_located_offers(pool: &PgPool) -> Result<Vec<Offer>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(concat!(
        "SELECT ",
        offer_columns!(),
        " FROM ride_offers \
         WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
         ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows_into_offers(rows)
}
