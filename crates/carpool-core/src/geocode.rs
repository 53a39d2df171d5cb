use std::future::Future;

use crate::geo::Coordinate;
use crate::offers::Address;

/// Resolves postal addresses to coordinates.
///
/// Implementations absorb upstream failures: `None` covers both "no match"
/// and "service unavailable after retries".
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &Address) -> impl Future<Output = Option<Coordinate>> + Send;
}

impl<G: Geocoder> Geocoder for std::sync::Arc<G> {
    fn resolve(&self, address: &Address) -> impl Future<Output = Option<Coordinate>> + Send {
        (**self).resolve(address)
    }
}
