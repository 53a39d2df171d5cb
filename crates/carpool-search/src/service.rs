use carpool_core::{
    fallback_matches, within_radius, Address, Coordinate, Diagnostics, Geocoder, Offer,
    OfferFields, OfferStore, SearchQuery, SearchResult, SearchStrategy, TracingDiagnostics,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to load offers: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Search orchestrator.
///
/// Geocoding failures never abort a search; they switch it to textual
/// matching. Store failures do propagate.
pub struct SearchService<G, S, D = TracingDiagnostics> {
    geocoder: G,
    store: S,
    diagnostics: D,
}

impl<G: Geocoder, S: OfferStore> SearchService<G, S> {
    pub fn new(geocoder: G, store: S) -> Self {
        Self {
            geocoder,
            store,
            diagnostics: TracingDiagnostics::new("search"),
        }
    }
}

impl<G, S, D> SearchService<G, S, D> {
    /// Replaces the diagnostics sink.
    pub fn with_diagnostics<D2: Diagnostics>(self, diagnostics: D2) -> SearchService<G, S, D2> {
        SearchService {
            geocoder: self.geocoder,
            store: self.store,
            diagnostics,
        }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<G: Geocoder, S: OfferStore, D: Diagnostics> SearchService<G, S, D> {
    /// Runs a proximity search.
    ///
    /// The query address is geocoded without a street. When that yields a
    /// coordinate and the radius is positive, located offers within the
    /// radius are returned nearest first. Otherwise located offers are
    /// matched on zip code and city and returned in store order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Store`] if the offer store cannot be read.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let lookup = Address::new(query.address().zip_code.clone(), query.address().city.clone());
        let coordinates = self.geocoder.resolve(&lookup).await;

        let candidates: Vec<Offer> = self
            .store
            .located_offers()
            .await
            .map_err(|e| SearchError::Store(Box::new(e)))?
            .into_iter()
            .filter(|offer| offer.coordinates.is_some())
            .collect();

        let (offers, strategy) = match coordinates {
            Some(center) if query.radius_km() > 0 => {
                self.diagnostics.info(&format!(
                    "Performing radius search with coordinates {center}, radius: {}km",
                    query.radius_km()
                ));
                let located = candidates
                    .into_iter()
                    .filter_map(|offer| offer.coordinates.map(|c| (offer, c)));
                // Radius is bounded to [0, 100].
                #[allow(clippy::cast_precision_loss)]
                let radius = query.radius_km() as f64;
                let ranked = within_radius(center, located, radius);
                (
                    ranked.into_iter().map(|r| r.item).collect::<Vec<_>>(),
                    SearchStrategy::Radius,
                )
            }
            _ => {
                self.diagnostics
                    .info("Performing fallback search without radius");
                let matched = candidates
                    .into_iter()
                    .filter(|offer| fallback_matches(offer, query.address()))
                    .collect::<Vec<_>>();
                (matched, SearchStrategy::Fallback)
            }
        };

        self.diagnostics
            .info(&format!("Search found {} results", offers.len()));

        Ok(SearchResult {
            offers,
            coordinates,
            strategy,
        })
    }

    /// Decides the coordinates to store for a created or updated offer.
    ///
    /// A new offer is always geocoded with its full address. An update is
    /// only geocoded when zip code, city or street changed; if that lookup
    /// fails the previous coordinates stay.
    pub async fn assign_coordinates(
        &self,
        fields: &OfferFields,
        previous: Option<&Offer>,
    ) -> Option<Coordinate> {
        match previous {
            None => self.geocoder.resolve(&fields.address()).await,
            Some(offer) if !offer.address_differs(fields) => {
                tracing::debug!(offer_id = offer.id, "address unchanged, keeping coordinates");
                offer.coordinates
            }
            Some(offer) => {
                let resolved = self.geocoder.resolve(&fields.address()).await;
                if resolved.is_none() && offer.coordinates.is_some() {
                    self.diagnostics.warn(&format!(
                        "Keeping previous coordinates for offer {}: new address could not be geocoded",
                        offer.id
                    ));
                }
                resolved.or(offer.coordinates)
            }
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
