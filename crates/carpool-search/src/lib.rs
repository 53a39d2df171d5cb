//! Proximity search over ride offers.
//!
//! [`SearchService`] combines a [`Geocoder`](carpool_core::Geocoder), an
//! [`OfferStore`](carpool_core::OfferStore) and the distance engine into a
//! single search operation, and assigns coordinates to offers on the write
//! path.

mod service;

pub use service::{SearchError, SearchService};
