use carpool_core::{Offer, OfferStore};
use sqlx::PgPool;

use super::read::list_located_offers;
use crate::DbError;

/// [`OfferStore`] backed by the `ride_offers` table.
#[derive(Debug, Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl OfferStore for PgOfferStore {
    type Error = DbError;

    async fn located_offers(&self) -> Result<Vec<Offer>, DbError> {
        list_located_offers(&self.pool).await
    }
}
