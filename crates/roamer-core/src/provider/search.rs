//! Nearby search fanned out per place type and merged by provider id.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::PlaceProvider;
use crate::category::CategoryRegistry;
use crate::concurrency::map_bounded;
use crate::geo::GeoLocation;
use crate::place::Place;

/// One unfiltered search plus one per registered category's first tag.
pub fn default_search_types(registry: &CategoryRegistry) -> Vec<Option<String>> {
    std::iter::once(None)
        .chain(
            registry
                .categories()
                .iter()
                .filter_map(|c| c.sub_types.first())
                .map(|t| Some(t.to_string())),
        )
        .collect()
}

/// Runs one nearby search per type and merges the results.
pub struct SearchService {
    provider: Arc<dyn PlaceProvider>,
    types: Vec<Option<String>>,
    max_concurrency: usize,
}

impl SearchService {
    pub fn new(provider: Arc<dyn PlaceProvider>, types: Vec<Option<String>>) -> Self {
        Self {
            provider,
            types,
            max_concurrency: 8,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Search around `location`.
    ///
    /// Results are concatenated in type order, keeping the first place seen
    /// per provider id. A failed type search is logged and skipped.
    pub async fn search_nearby(
        &self,
        location: GeoLocation,
        radius_meters: f64,
        cancel: &CancellationToken,
    ) -> Vec<Place> {
        let results = map_bounded(self.types.clone(), self.max_concurrency, cancel, |type_filter| {
            let provider = self.provider.clone();
            async move {
                let found = provider
                    .search_nearby(location, radius_meters, type_filter.as_deref())
                    .await;
                (type_filter, found)
            }
        })
        .await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut failed = 0usize;
        for (type_filter, found) in results.into_iter().flatten() {
            match found {
                Ok(places) => {
                    for place in places {
                        if seen.insert(place.provider_id.clone()) {
                            merged.push(place);
                        }
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        type_filter = type_filter.as_deref().unwrap_or("*"),
                        error = %e,
                        "nearby search failed"
                    );
                }
            }
        }

        info!(
            searches = self.types.len(),
            failed,
            places = merged.len(),
            "nearby search complete"
        );
        merged
    }
}
