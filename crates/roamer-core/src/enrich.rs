//! Concurrent per-place enrichment with partial-failure tolerance.
//!
//! Each (place, kind) pair becomes one provider call. Calls run in parallel
//! up to `max_concurrency`; a failed call is logged and leaves its field
//! unset. Results are written back by provider id once every call has
//! finished, so callers never observe a half-applied batch.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::concurrency::map_bounded;
use crate::place::{Photo, PhotoSize, Place, PlaceDetail};
use crate::provider::PlaceProvider;
use crate::session::{SessionStore, StoreError};

pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    Photos,
    /// Provider detail: reviews, photo references, opening hours.
    Reviews,
    PriceLevel,
}

impl EnrichmentKind {
    pub const ALL: [EnrichmentKind; 3] = [Self::Photos, Self::Reviews, Self::PriceLevel];

    /// Whether `place` already carries this kind of data.
    fn is_present(self, place: &Place) -> bool {
        match self {
            Self::Photos => !place.photos.is_empty(),
            Self::Reviews => place.detail.is_some() || !place.reviews.is_empty(),
            Self::PriceLevel => place.price_level.is_some(),
        }
    }
}

impl fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photos => write!(f, "photos"),
            Self::Reviews => write!(f, "reviews"),
            Self::PriceLevel => write!(f, "price_level"),
        }
    }
}

/// Counts for one enrichment batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub attempted: usize,
    /// Calls avoided because the data was already present.
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Provider ids of places that received new data, in first-seen order.
    pub changed: Vec<String>,
}

enum Fetched {
    Photos(Vec<Photo>),
    Detail(PlaceDetail),
    PriceLevel(Option<u8>),
}

pub struct Enricher {
    provider: Arc<dyn PlaceProvider>,
    photo_sizes: Vec<PhotoSize>,
    max_concurrency: usize,
}

impl Enricher {
    pub fn new(provider: Arc<dyn PlaceProvider>) -> Self {
        Self {
            provider,
            photo_sizes: vec![PhotoSize::SMALL, PhotoSize::LARGE],
            max_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
        }
    }

    pub fn with_photo_sizes(mut self, sizes: Vec<PhotoSize>) -> Self {
        self.photo_sizes = sizes;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Fetch the requested kinds for every place and write them back.
    pub async fn enrich(
        &self,
        places: &mut [Place],
        kinds: &[EnrichmentKind],
        cancel: &CancellationToken,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        let mut seen = HashSet::new();
        let mut jobs = Vec::new();

        for place in places.iter() {
            if !seen.insert(place.provider_id.clone()) {
                continue;
            }
            for &kind in kinds {
                if kind.is_present(place) {
                    report.skipped += 1;
                } else {
                    jobs.push((place.provider_id.clone(), kind));
                }
            }
        }
        report.attempted = jobs.len();

        let results = map_bounded(jobs.clone(), self.max_concurrency, cancel, |(provider_id, kind)| {
            let provider = self.provider.clone();
            let sizes = self.photo_sizes.clone();
            async move {
                match kind {
                    EnrichmentKind::Photos => provider
                        .fetch_photos(&provider_id, &sizes)
                        .await
                        .map(Fetched::Photos),
                    EnrichmentKind::Reviews => provider
                        .fetch_detail(&provider_id)
                        .await
                        .map(Fetched::Detail),
                    EnrichmentKind::PriceLevel => provider
                        .fetch_price_level(&provider_id)
                        .await
                        .map(Fetched::PriceLevel),
                }
            }
        })
        .await;

        // Join barrier passed: apply everything at once.
        for ((provider_id, kind), result) in jobs.into_iter().zip(results) {
            let fetched = match result {
                Some(Ok(fetched)) => fetched,
                Some(Err(e)) => {
                    warn!(provider_id = %provider_id, kind = %kind, error = %e, "enrichment call failed");
                    report.failed += 1;
                    continue;
                }
                None => {
                    warn!(provider_id = %provider_id, kind = %kind, "enrichment call did not finish");
                    report.failed += 1;
                    continue;
                }
            };
            report.succeeded += 1;

            let mut touched = false;
            for place in places.iter_mut().filter(|p| p.provider_id == provider_id) {
                touched |= apply(place, &fetched);
            }
            if touched && !report.changed.contains(&provider_id) {
                report.changed.push(provider_id);
            }
        }

        info!(
            places = seen.len(),
            attempted = report.attempted,
            skipped = report.skipped,
            failed = report.failed,
            "enrichment complete"
        );
        report
    }

    /// Enrich, then write the changed places back to the session's cache.
    pub async fn enrich_and_cache(
        &self,
        store: &dyn SessionStore,
        session_id: Uuid,
        places: &mut [Place],
        kinds: &[EnrichmentKind],
        cancel: &CancellationToken,
    ) -> Result<EnrichmentReport, StoreError> {
        let report = self.enrich(places, kinds, cancel).await;
        if report.changed.is_empty() {
            return Ok(report);
        }

        let mut written = HashSet::new();
        let changed: Vec<Place> = places
            .iter()
            .filter(|p| report.changed.contains(&p.provider_id) && written.insert(p.provider_id.clone()))
            .cloned()
            .collect();
        let replaced = store.update_search_results(session_id, &changed).await?;
        tracing::debug!(session_id = %session_id, replaced, "enriched places cached");
        Ok(report)
    }
}

/// Apply fetched data; returns whether the place changed.
fn apply(place: &mut Place, fetched: &Fetched) -> bool {
    match fetched {
        Fetched::Photos(photos) => {
            if photos.is_empty() {
                return false;
            }
            place.photos = photos.clone();
        }
        Fetched::Detail(detail) => {
            if place.reviews.is_empty() {
                place.reviews = detail.reviews.clone();
            }
            if place.opening_hours.is_none() {
                place.opening_hours = detail.opening_hours.clone();
            }
            if place.photo_references.is_empty() {
                place.photo_references = detail.photo_references.clone();
            }
            place.detail = Some(detail.clone());
        }
        Fetched::PriceLevel(level) => {
            if level.is_none() {
                return false;
            }
            place.price_level = *level;
        }
    }
    true
}
