//! Building several itineraries that never share a place.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Itinerary, ItineraryBuilder, ItineraryError, ItineraryRequest};
use crate::concurrency::map_bounded;
use crate::place::Place;

/// How itineraries of one run claim places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStrategy {
    /// Build one after another; each sees the places earlier ones took.
    #[default]
    Sequential,
    /// Build concurrently, then drop places claimed by earlier anchors.
    Parallel,
}

impl std::fmt::Display for ClaimStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimStrategy::Sequential => write!(f, "sequential"),
            ClaimStrategy::Parallel => write!(f, "parallel"),
        }
    }
}

/// Build one itinerary per anchor, in anchor order.
///
/// Whatever the strategy, no place appears in more than one returned
/// itinerary and every itinerary keeps its own anchor.
pub async fn build_all(
    builder: Arc<ItineraryBuilder>,
    request: ItineraryRequest,
    anchors: Vec<Place>,
    pool: Arc<Vec<Place>>,
    strategy: ClaimStrategy,
    cancel: &CancellationToken,
) -> Result<Vec<Itinerary>, ItineraryError> {
    if pool.is_empty() {
        return Err(ItineraryError::EmptyPool);
    }
    let anchor_ids: HashSet<String> = anchors.iter().map(|a| a.provider_id.clone()).collect();

    let itineraries = match strategy {
        ClaimStrategy::Sequential => {
            let mut claimed = anchor_ids;
            let mut built = Vec::with_capacity(anchors.len());
            for anchor in &anchors {
                if cancel.is_cancelled() {
                    info!(built = built.len(), "itinerary building cancelled");
                    break;
                }
                claimed.remove(&anchor.provider_id);
                match builder.build(&request, anchor, &pool, &claimed) {
                    Ok(itinerary) => {
                        claimed.extend(itinerary.places.iter().map(|p| p.provider_id.clone()));
                        built.push(itinerary);
                    }
                    Err(e) => warn!(anchor = %anchor.name, error = %e, "skipping anchor"),
                }
                claimed.insert(anchor.provider_id.clone());
            }
            built
        }
        ClaimStrategy::Parallel => {
            let limit = anchors.len();
            let results = map_bounded(anchors, limit, cancel, |anchor| {
                let builder = builder.clone();
                let request = request.clone();
                let pool = pool.clone();
                let mut claimed = anchor_ids.clone();
                async move {
                    claimed.remove(&anchor.provider_id);
                    builder.build(&request, &anchor, &pool, &claimed)
                }
            })
            .await;

            let mut built = Vec::with_capacity(results.len());
            for result in results.into_iter().flatten() {
                match result {
                    Ok(itinerary) => built.push(itinerary),
                    Err(e) => warn!(error = %e, "skipping anchor"),
                }
            }
            reconcile(&builder, &request, built)
        }
    };

    debug!(strategy = %strategy, count = itineraries.len(), "itineraries built");
    Ok(itineraries)
}

/// Remove places already claimed by an earlier itinerary, in order.
///
/// Shortened itineraries are re-ordered and their totals recomputed.
/// Opening hours are not re-checked: removing a stop only moves later
/// arrivals earlier.
pub fn reconcile(
    builder: &ItineraryBuilder,
    request: &ItineraryRequest,
    itineraries: Vec<Itinerary>,
) -> Vec<Itinerary> {
    let mut claimed: HashSet<String> = itineraries
        .iter()
        .map(|i| i.anchor_provider_id.clone())
        .collect();
    let mut out = Vec::with_capacity(itineraries.len());

    for itinerary in itineraries {
        let before = itinerary.places.len();
        let anchor_id = itinerary.anchor_provider_id;
        let kept: Vec<Place> = itinerary
            .places
            .into_iter()
            .filter(|p| p.provider_id == anchor_id || !claimed.contains(&p.provider_id))
            .collect();
        if kept.len() != before {
            debug!(anchor = %anchor_id, removed = before - kept.len(), "dropped shared places");
        }
        claimed.extend(kept.iter().map(|p| p.provider_id.clone()));
        out.push(builder.finish(request, anchor_id, kept));
    }
    out
}
