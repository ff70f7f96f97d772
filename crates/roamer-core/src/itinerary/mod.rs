//! Greedy, constraint-checked itinerary construction around one anchor.
//!
//! Starting from the anchor, the builder repeatedly adds the best-rated
//! nearby place that keeps the itinerary within its time budget, food
//! quotas, and (when leaving now) opening hours. The search radius follows
//! the last stop of the current best-known order, so the itinerary can walk
//! away from the anchor.

mod claims;
pub mod route;

pub use claims::{ClaimStrategy, build_all, reconcile};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::CategoryRegistry;
use crate::geo::{GeoLocation, WALKING_SPEED_METERS_PER_MINUTE, distance_meters};
use crate::place::Place;

/// Per-category caps on food and drink stops, by main category.
pub const FOOD_QUOTAS: &[(&str, usize)] = &[("restaurant", 1), ("cafe", 2), ("bakery", 2)];

/// Errors from building a single itinerary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItineraryError {
    #[error("no candidate places to build an itinerary from")]
    EmptyPool,
}

/// Tunables of the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryConfig {
    /// Maximum stops, anchor included.
    pub max_places: usize,
    /// Next stops are searched within this distance of the last stop.
    pub local_radius_meters: f64,
    /// Budget applied when the caller gives none.
    pub default_free_time_minutes: u32,
    pub walking_speed_meters_per_minute: f64,
}

impl Default for ItineraryConfig {
    fn default() -> Self {
        Self {
            max_places: 4,
            local_radius_meters: 500.0,
            default_free_time_minutes: 180,
            walking_speed_meters_per_minute: WALKING_SPEED_METERS_PER_MINUTE,
        }
    }
}

/// Per-request inputs shared by every itinerary of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryRequest {
    pub start: GeoLocation,
    /// Time budget in minutes; `None` uses the configured default.
    pub free_time_minutes: Option<u32>,
    /// Set when the user is leaving right now; enables opening-hours checks.
    pub departure: Option<NaiveDateTime>,
}

/// A finished itinerary: stops in visiting order plus total minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub anchor_provider_id: String,
    pub places: Vec<Place>,
    pub total_minutes: u32,
}

impl Itinerary {
    pub fn anchor(&self) -> Option<&Place> {
        self.places
            .iter()
            .find(|p| p.provider_id == self.anchor_provider_id)
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.places.iter().any(|p| p.provider_id == provider_id)
    }
}

/// Builds itineraries against a shared category registry.
#[derive(Debug, Clone)]
pub struct ItineraryBuilder {
    registry: Arc<CategoryRegistry>,
    config: ItineraryConfig,
}

impl ItineraryBuilder {
    pub fn new(registry: Arc<CategoryRegistry>, config: ItineraryConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &ItineraryConfig {
        &self.config
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Build one itinerary seeded with `anchor`.
    ///
    /// `claimed` holds provider ids owned by other itineraries. An anchor
    /// that fits no other stop still yields a single-stop itinerary, even
    /// when the anchor alone exceeds the budget.
    pub fn build(
        &self,
        request: &ItineraryRequest,
        anchor: &Place,
        pool: &[Place],
        claimed: &HashSet<String>,
    ) -> Result<Itinerary, ItineraryError> {
        if pool.is_empty() {
            return Err(ItineraryError::EmptyPool);
        }

        let budget = request
            .free_time_minutes
            .unwrap_or(self.config.default_free_time_minutes);
        let speed = self.config.walking_speed_meters_per_minute;

        let mut stops = vec![anchor.clone()];
        let mut total = route::total_minutes(&request.start, &stops, &self.registry, speed);

        while stops.len() < self.config.max_places {
            let Some(last) = stops.last().map(|p| p.location) else {
                break;
            };

            let mut candidates: Vec<&Place> = pool
                .iter()
                .filter(|p| distance_meters(&last, &p.location) <= self.config.local_radius_meters)
                .filter(|p| !stops.iter().any(|s| s.provider_id == p.provider_id))
                .filter(|p| !claimed.contains(&p.provider_id))
                .filter(|p| !self.exceeds_food_quota(p, &stops))
                .collect();
            candidates.sort_by(|a, b| b.rating.total_cmp(&a.rating));

            let mut extended = None;
            for candidate in candidates {
                let mut tentative = stops.clone();
                tentative.push(candidate.clone());
                let ordered = route::order_nearest_neighbor(&request.start, tentative);
                let minutes = route::total_minutes(&request.start, &ordered, &self.registry, speed);
                if minutes > budget {
                    debug!(candidate = %candidate.name, minutes, budget, "candidate over budget");
                    continue;
                }
                if let Some(departure) = request.departure {
                    if !route::open_throughout(&request.start, &ordered, departure, &self.registry, speed) {
                        debug!(candidate = %candidate.name, "candidate closed during visit");
                        continue;
                    }
                }
                extended = Some((ordered, minutes));
                break;
            }

            match extended {
                Some((ordered, minutes)) => {
                    stops = ordered;
                    total = minutes;
                }
                None => break,
            }
        }

        Ok(Itinerary {
            anchor_provider_id: anchor.provider_id.clone(),
            places: stops,
            total_minutes: total,
        })
    }

    /// Re-order `places` and recompute the total for them.
    pub fn finish(&self, request: &ItineraryRequest, anchor_provider_id: String, places: Vec<Place>) -> Itinerary {
        let places = route::order_nearest_neighbor(&request.start, places);
        let total_minutes = route::total_minutes(
            &request.start,
            &places,
            &self.registry,
            self.config.walking_speed_meters_per_minute,
        );
        Itinerary {
            anchor_provider_id,
            places,
            total_minutes,
        }
    }

    fn exceeds_food_quota(&self, candidate: &Place, stops: &[Place]) -> bool {
        let Some(category) = candidate.main_category(&self.registry) else {
            return false;
        };
        let Some(&(_, limit)) = FOOD_QUOTAS.iter().find(|(name, _)| *name == category.name) else {
            return false;
        };
        let used = stops
            .iter()
            .filter(|s| s.main_category(&self.registry).is_some_and(|c| c.name == category.name))
            .count();
        used >= limit
    }
}
