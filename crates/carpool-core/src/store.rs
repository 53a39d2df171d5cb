use std::future::Future;

use crate::offers::Offer;

/// Read access to stored offers for the search path.
pub trait OfferStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All offers whose coordinates are set, in insertion order.
    fn located_offers(&self) -> impl Future<Output = Result<Vec<Offer>, Self::Error>> + Send;
}
