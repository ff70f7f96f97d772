//! Pure filters over candidate place lists.
//!
//! Every filter borrows its input and returns a new list; input order is
//! preserved and applying a filter twice gives the same result as once.
//! [`FilterPipeline`] chains them in the conventional order.

mod pipeline;

pub use pipeline::{FilterPipeline, FilterStep, RatingThreshold};

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::category::{Category, CategoryRegistry};
use crate::geo::{GeoLocation, distance_meters};
use crate::place::Place;

/// Name fragments marking a company rather than a venue.
pub const ORGANIZATION_MARKERS: &[&str] = &[
    "株式会社",
    "有限会社",
    "合同会社",
    "合資会社",
    "合名会社",
    "(株)",
    "（株）",
    "Co., Ltd.",
];

/// Keep the first place per provider id.
pub fn remove_duplicates(places: &[Place]) -> Vec<Place> {
    let mut seen = HashSet::with_capacity(places.len());
    places
        .iter()
        .filter(|p| seen.insert(p.provider_id.as_str()))
        .cloned()
        .collect()
}

/// Drop places carrying any never-recommend tag.
pub fn exclude_ignored_categories(places: &[Place], registry: &CategoryRegistry) -> Vec<Place> {
    places
        .iter()
        .filter(|p| !registry.is_ignored(&p.types))
        .cloned()
        .collect()
}

/// Keep places matching at least one of `allowed`.
pub fn keep_categories(places: &[Place], allowed: &[&Category]) -> Vec<Place> {
    places
        .iter()
        .filter(|p| allowed.iter().any(|c| c.matches(&p.types)))
        .cloned()
        .collect()
}

/// Drop places matching any of `rejected`.
pub fn exclude_categories(places: &[Place], rejected: &[&Category]) -> Vec<Place> {
    places
        .iter()
        .filter(|p| !rejected.iter().any(|c| c.matches(&p.types)))
        .cloned()
        .collect()
}

/// Drop places whose name looks like a company name.
pub fn exclude_organizations(places: &[Place]) -> Vec<Place> {
    places
        .iter()
        .filter(|p| !ORGANIZATION_MARKERS.iter().any(|m| p.name.contains(m)))
        .cloned()
        .collect()
}

/// Keep places whose distance from `reference` lies in `[start_meters, end_meters)`.
pub fn within_distance_range(
    places: &[Place],
    reference: &GeoLocation,
    start_meters: f64,
    end_meters: f64,
) -> Vec<Place> {
    places
        .iter()
        .filter(|p| {
            let d = distance_meters(reference, &p.location);
            d >= start_meters && d < end_meters
        })
        .cloned()
        .collect()
}

/// Keep places known to be open at local time `at`.
///
/// A place without opening-hours data is dropped.
pub fn open_at(places: &[Place], at: NaiveDateTime) -> Vec<Place> {
    places
        .iter()
        .filter(|p| p.hours().is_some_and(|h| h.is_open_at(at)))
        .cloned()
        .collect()
}

/// Keep places with a fetched or fetchable photo.
pub fn with_photos(places: &[Place]) -> Vec<Place> {
    places
        .iter()
        .filter(|p| p.has_photo_source())
        .cloned()
        .collect()
}

/// Keep places rated at least `min_rating` by at least `min_count` reviewers.
pub fn with_min_rating(places: &[Place], min_rating: f64, min_count: u32) -> Vec<Place> {
    places
        .iter()
        .filter(|p| p.rating >= min_rating && p.rating_count >= min_count)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::OpeningHours;
    use chrono::{NaiveDate, NaiveTime};

    fn loc(lat: f64, lng: f64) -> GeoLocation {
        GeoLocation::new(lat, lng).unwrap()
    }

    fn place(id: &str, name: &str, types: &[&str]) -> Place {
        Place::new(
            id,
            name,
            loc(35.0, 139.0),
            types.iter().map(|t| t.to_string()).collect(),
        )
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.provider_id.as_str()).collect()
    }

    #[test]
    fn remove_duplicates_keeps_first_occurrence_in_order() {
        let input = vec![
            place("a", "first a", &["cafe"]),
            place("b", "b", &["cafe"]),
            place("a", "second a", &["cafe"]),
            place("c", "c", &["cafe"]),
            place("b", "second b", &["cafe"]),
        ];
        let out = remove_duplicates(&input);
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
        assert_eq!(out[0].name, "first a");
        assert!(out.len() <= input.len());
        assert_eq!(remove_duplicates(&out), out);
    }

    #[test]
    fn museum_survives_atm_does_not() {
        let registry = CategoryRegistry::standard();
        let input = vec![place("m", "City Museum", &["museum"]), place("x", "ATM", &["atm"])];
        let denied = exclude_ignored_categories(&input, &registry);
        let allowed: Vec<&Category> = registry.categories().iter().collect();
        let out = keep_categories(&denied, &allowed);
        assert_eq!(ids(&out), vec!["m"]);
    }

    #[test]
    fn deny_list_wins_over_matching_category() {
        let registry = CategoryRegistry::standard();
        let input = vec![place("s", "Station mall", &["shopping_mall", "train_station"])];
        assert!(exclude_ignored_categories(&input, &registry).is_empty());
    }

    #[test]
    fn category_exclusion_drops_any_match() {
        let registry = CategoryRegistry::standard();
        let input = vec![
            place("c", "Cafe", &["cafe"]),
            place("r", "Diner", &["restaurant", "cafe"]),
            place("m", "Museum", &["museum"]),
        ];
        let rejected = registry.resolve(&["cafe"]);
        assert_eq!(ids(&exclude_categories(&input, &rejected)), vec!["m"]);
        assert_eq!(ids(&keep_categories(&input, &rejected)), vec!["c", "r"]);
    }

    #[test]
    fn organization_names_are_dropped() {
        let input = vec![
            place("a", "株式会社サンプル", &["store"]),
            place("b", "Sample Co., Ltd.", &["store"]),
            place("c", "Corner Bakery", &["bakery"]),
        ];
        assert_eq!(ids(&exclude_organizations(&input)), vec!["c"]);
    }

    #[test]
    fn distance_range_is_half_open() {
        let reference = loc(35.0, 139.0);
        let mut near = place("near", "near", &["cafe"]);
        near.location = reference;
        let mut far = place("far", "far", &["cafe"]);
        far.location = loc(35.01, 139.0);
        let far_distance = distance_meters(&reference, &far.location);

        let input = vec![near, far];
        // Lower bound inclusive: distance 0 kept by [0, x).
        assert_eq!(ids(&within_distance_range(&input, &reference, 0.0, 10.0)), vec!["near"]);
        // Upper bound exclusive.
        assert!(
            within_distance_range(&input, &reference, 1.0, far_distance).is_empty()
        );
        assert_eq!(
            ids(&within_distance_range(&input, &reference, far_distance, far_distance + 1.0)),
            vec!["far"]
        );
    }

    #[test]
    fn open_at_requires_known_open_hours() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let noon = NaiveDate::from_ymd_opt(2024, 6, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let night = NaiveDate::from_ymd_opt(2024, 6, 5)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();

        let input = vec![
            place("open", "Open", &["cafe"]).with_opening_hours(OpeningHours::daily(nine, five)),
            place("unknown", "Unknown", &["cafe"]),
        ];
        assert_eq!(ids(&open_at(&input, noon)), vec!["open"]);
        assert!(open_at(&input, night).is_empty());
    }

    #[test]
    fn photo_and_rating_filters() {
        let input = vec![
            place("a", "a", &["cafe"]).with_rating(4.5, 100).with_photo_references(vec!["r".into()]),
            place("b", "b", &["cafe"]).with_rating(4.8, 3),
            place("c", "c", &["cafe"]).with_rating(2.9, 500),
        ];
        assert_eq!(ids(&with_photos(&input)), vec!["a"]);
        assert_eq!(ids(&with_min_rating(&input, 3.0, 10)), vec!["a"]);
        assert_eq!(ids(&with_min_rating(&input, 0.0, 0)), vec!["a", "b", "c"]);
    }

    #[test]
    fn filters_are_idempotent() {
        let registry = CategoryRegistry::standard();
        let reference = loc(35.0, 139.0);
        let input = vec![
            place("a", "A", &["cafe"]).with_rating(4.0, 20),
            place("a", "A dup", &["cafe"]),
            place("b", "株式会社B", &["museum"]),
            place("c", "C", &["atm"]).with_photo_references(vec!["r".into()]),
        ];
        let allowed: Vec<&Category> = registry.categories().iter().collect();

        let filters: Vec<Box<dyn Fn(&[Place]) -> Vec<Place>>> = vec![
            Box::new(remove_duplicates),
            Box::new(|p: &[Place]| exclude_ignored_categories(p, &registry)),
            Box::new(|p: &[Place]| keep_categories(p, &allowed)),
            Box::new(|p: &[Place]| exclude_categories(p, &registry.resolve(&["museum"]))),
            Box::new(exclude_organizations),
            Box::new(|p: &[Place]| within_distance_range(p, &reference, 0.0, 100.0)),
            Box::new(with_photos),
            Box::new(|p: &[Place]| with_min_rating(p, 3.5, 10)),
        ];
        for f in &filters {
            let once = f(&input);
            assert_eq!(f(&once), once);
        }
    }
}
