//! Choosing the starting places ("anchors") that each seed one itinerary.
//!
//! Anchors are picked to overlap as little as possible: pass one takes the
//! best-rated places with distinct main categories that are spread apart,
//! pass two fills any remaining slots with the places farthest from the
//! anchors chosen so far.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::category::CategoryRegistry;
use crate::filter;
use crate::geo::distance_meters;
use crate::place::Place;

/// Default number of anchors.
pub const DEFAULT_ANCHOR_COUNT: usize = 3;

/// Default minimum separation between anchors chosen in the first pass.
pub const DEFAULT_MIN_SEPARATION_METERS: f64 = 500.0;

#[derive(Debug, Clone)]
pub struct AnchorOptions {
    /// Maximum number of anchors to return.
    pub count: usize,
    /// First-pass anchors must be at least this far apart.
    pub min_separation_meters: f64,
    /// Category names the user rejected.
    pub disliked_categories: Vec<String>,
    /// When set, only places open at this local time are eligible.
    pub open_at: Option<NaiveDateTime>,
    /// Provider id of a place that must be the first anchor.
    pub must_include: Option<String>,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_ANCHOR_COUNT,
            min_separation_meters: DEFAULT_MIN_SEPARATION_METERS,
            disliked_categories: Vec::new(),
            open_at: None,
            must_include: None,
        }
    }
}

/// Pick up to `options.count` distinct anchors from `pool`.
///
/// Returns `min(count, eligible)` places, pairwise distinct by provider id.
pub fn select_anchors(
    pool: &[Place],
    registry: &CategoryRegistry,
    options: &AnchorOptions,
) -> Vec<Place> {
    let mut eligible = filter::remove_duplicates(pool);
    if !options.disliked_categories.is_empty() {
        eligible = filter::exclude_categories(&eligible, &registry.resolve(&options.disliked_categories));
    }
    if let Some(at) = options.open_at {
        eligible = filter::open_at(&eligible, at);
    }

    let target = options.count.min(eligible.len());
    let mut accepted: Vec<usize> = Vec::with_capacity(target);
    if target == 0 {
        return Vec::new();
    }

    if let Some(provider_id) = &options.must_include {
        match eligible.iter().position(|p| &p.provider_id == provider_id) {
            Some(index) if eligible[index].is_building() => accepted.push(index),
            Some(_) => warn!(provider_id = %provider_id, "requested anchor is not a building, ignoring"),
            None => warn!(provider_id = %provider_id, "requested anchor is not eligible, ignoring"),
        }
    }

    // Pass 1: diversity by rating. Stable sort keeps input order on ties.
    let mut by_rating: Vec<usize> = (0..eligible.len()).collect();
    by_rating.sort_by(|&a, &b| eligible[b].rating.total_cmp(&eligible[a].rating));

    for index in by_rating {
        if accepted.len() >= target {
            break;
        }
        if accepted.contains(&index) {
            continue;
        }
        let candidate = &eligible[index];
        let category = candidate.main_category(registry).map(|c| c.name);
        let conflicts = accepted.iter().any(|&a| {
            let anchor = &eligible[a];
            let same_category =
                category.is_some() && anchor.main_category(registry).map(|c| c.name) == category;
            same_category
                || distance_meters(&anchor.location, &candidate.location) < options.min_separation_meters
        });
        if !conflicts {
            debug!(anchor = %candidate.name, rating = candidate.rating, "anchor accepted by rating");
            accepted.push(index);
        }
    }

    // Pass 2: farthest-point fill.
    while accepted.len() < target {
        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in eligible.iter().enumerate() {
            if accepted.contains(&index) {
                continue;
            }
            let spread: f64 = accepted
                .iter()
                .map(|&a| distance_meters(&eligible[a].location, &candidate.location))
                .sum();
            if best.is_none_or(|(_, best_spread)| spread > best_spread) {
                best = Some((index, spread));
            }
        }
        let Some((index, _)) = best else {
            break;
        };
        debug!(anchor = %eligible[index].name, "anchor accepted by separation");
        accepted.push(index);
    }

    accepted.into_iter().map(|i| eligible[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoLocation;
    use std::collections::HashSet;

    /// Roughly `meters` north of (35.0, 139.0).
    fn north(meters: f64) -> GeoLocation {
        GeoLocation::new(35.0 + meters / 111_320.0, 139.0).unwrap()
    }

    fn place(id: &str, types: &[&str], rating: f64, meters_north: f64) -> Place {
        let mut tags: Vec<String> = types.iter().map(|t| t.to_string()).collect();
        tags.push("establishment".to_string());
        Place::new(id, id, north(meters_north), tags).with_rating(rating, 100)
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.provider_id.as_str()).collect()
    }

    #[test]
    fn first_pass_prefers_rating_with_distinct_categories() {
        let registry = CategoryRegistry::standard();
        let pool = vec![
            place("cafe-low", &["cafe"], 3.0, 0.0),
            place("cafe-high", &["cafe"], 4.9, 1000.0),
            place("museum", &["museum"], 4.5, 2000.0),
            place("park", &["park"], 4.0, 3000.0),
        ];
        let anchors = select_anchors(&pool, &registry, &AnchorOptions::default());
        assert_eq!(ids(&anchors), vec!["cafe-high", "museum", "park"]);
    }

    #[test]
    fn first_pass_rejects_close_places_second_pass_fills() {
        let registry = CategoryRegistry::standard();
        let pool = vec![
            place("a", &["cafe"], 5.0, 0.0),
            place("b", &["museum"], 4.0, 100.0), // too close to a
            place("c", &["cafe"], 3.0, 3000.0),  // same category as a
            place("d", &["park"], 2.0, 1000.0),
        ];
        let anchors = select_anchors(&pool, &registry, &AnchorOptions::default());
        // Pass 1 takes a and d; pass 2 picks c (farthest from a + d).
        assert_eq!(ids(&anchors), vec!["a", "d", "c"]);
    }

    #[test]
    fn ties_in_rating_keep_input_order() {
        let registry = CategoryRegistry::standard();
        let pool = vec![
            place("first", &["cafe"], 4.0, 0.0),
            place("second", &["museum"], 4.0, 2000.0),
        ];
        let options = AnchorOptions {
            count: 1,
            ..AnchorOptions::default()
        };
        assert_eq!(ids(&select_anchors(&pool, &registry, &options)), vec!["first"]);
    }

    #[test]
    fn must_include_building_is_first() {
        let registry = CategoryRegistry::standard();
        let pool = vec![
            place("top", &["museum"], 5.0, 0.0),
            place("chosen", &["cafe"], 2.0, 3000.0),
        ];
        let options = AnchorOptions {
            must_include: Some("chosen".into()),
            ..AnchorOptions::default()
        };
        assert_eq!(ids(&select_anchors(&pool, &registry, &options)), vec!["chosen", "top"]);
    }

    #[test]
    fn must_include_non_building_is_ignored() {
        let registry = CategoryRegistry::standard();
        let mut area = Place::new("area", "area", north(3000.0), vec!["park".into()]);
        area.rating = 1.0;
        let pool = vec![place("top", &["museum"], 5.0, 0.0), area];
        let options = AnchorOptions {
            count: 1,
            must_include: Some("area".into()),
            ..AnchorOptions::default()
        };
        assert_eq!(ids(&select_anchors(&pool, &registry, &options)), vec!["top"]);
    }

    #[test]
    fn disliked_categories_are_never_anchors() {
        let registry = CategoryRegistry::standard();
        let pool = vec![place("cafe", &["cafe"], 5.0, 0.0), place("zoo", &["zoo"], 1.0, 2000.0)];
        let options = AnchorOptions {
            disliked_categories: vec!["cafe".into()],
            ..AnchorOptions::default()
        };
        assert_eq!(ids(&select_anchors(&pool, &registry, &options)), vec!["zoo"]);
    }

    #[test]
    fn anchors_are_distinct_and_bounded_by_pool() {
        let registry = CategoryRegistry::standard();
        let pool = vec![
            place("a", &["cafe"], 4.0, 0.0),
            place("a", &["cafe"], 4.0, 0.0),
            place("b", &["cafe"], 4.0, 10.0),
        ];
        let anchors = select_anchors(&pool, &registry, &AnchorOptions::default());
        assert_eq!(anchors.len(), 2);
        let unique: HashSet<&str> = ids(&anchors).into_iter().collect();
        assert_eq!(unique.len(), anchors.len());

        assert!(select_anchors(&[], &registry, &AnchorOptions::default()).is_empty());
    }
}
