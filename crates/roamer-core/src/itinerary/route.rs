//! Stop ordering and timing for an itinerary.

use chrono::{Duration, NaiveDateTime};

use crate::category::CategoryRegistry;
use crate::geo::{GeoLocation, distance_meters, travel_time_minutes};
use crate::place::Place;

/// Reorder `stops` by greedy nearest neighbour starting from `start`.
///
/// Each step takes the closest remaining stop to the one placed last; ties
/// go to the stop that came first in `stops`. Quadratic in the stop count.
pub fn order_nearest_neighbor(start: &GeoLocation, stops: Vec<Place>) -> Vec<Place> {
    let mut remaining = stops;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = *start;

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_distance = distance_meters(&current, &remaining[0].location);
        for (index, stop) in remaining.iter().enumerate().skip(1) {
            let d = distance_meters(&current, &stop.location);
            if d < best_distance {
                best = index;
                best_distance = d;
            }
        }
        let next = remaining.remove(best);
        current = next.location;
        ordered.push(next);
    }
    ordered
}

/// Travel minutes of each leg: start to the first stop, then stop to stop.
pub fn leg_minutes(start: &GeoLocation, stops: &[Place], speed_meters_per_minute: f64) -> Vec<u32> {
    let mut previous = *start;
    stops
        .iter()
        .map(|stop| {
            let minutes = travel_time_minutes(&previous, &stop.location, speed_meters_per_minute);
            previous = stop.location;
            minutes
        })
        .collect()
}

/// Total minutes: every leg plus the stay at every stop, saturating at
/// `u32::MAX`.
pub fn total_minutes(
    start: &GeoLocation,
    stops: &[Place],
    registry: &CategoryRegistry,
    speed_meters_per_minute: f64,
) -> u32 {
    let travel = leg_minutes(start, stops, speed_meters_per_minute)
        .into_iter()
        .fold(0u32, u32::saturating_add);
    stops
        .iter()
        .map(|s| s.stay_minutes(registry))
        .fold(travel, u32::saturating_add)
}

/// Projected arrival and wrap-up time at each stop when leaving at `departure`.
pub fn schedule(
    start: &GeoLocation,
    stops: &[Place],
    departure: NaiveDateTime,
    registry: &CategoryRegistry,
    speed_meters_per_minute: f64,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let legs = leg_minutes(start, stops, speed_meters_per_minute);
    let mut clock = departure;
    stops
        .iter()
        .zip(legs)
        .map(|(stop, leg)| {
            let arrival = clock + Duration::minutes(i64::from(leg));
            let wrap_up = arrival + Duration::minutes(i64::from(stop.stay_minutes(registry)));
            clock = wrap_up;
            (arrival, wrap_up)
        })
        .collect()
}

/// Whether every stop is open both on arrival and at wrap-up.
///
/// Opening periods are half-open, so a visit that wraps up exactly at
/// closing time fails. Stops without opening-hours data are assumed open.
pub fn open_throughout(
    start: &GeoLocation,
    stops: &[Place],
    departure: NaiveDateTime,
    registry: &CategoryRegistry,
    speed_meters_per_minute: f64,
) -> bool {
    schedule(start, stops, departure, registry, speed_meters_per_minute)
        .into_iter()
        .zip(stops)
        .all(|((arrival, wrap_up), stop)| match stop.hours() {
            Some(hours) => hours.is_open_at(arrival) && hours.is_open_at(wrap_up),
            None => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::OpeningHours;
    use chrono::{NaiveDate, NaiveTime};

    fn north(meters: f64) -> GeoLocation {
        GeoLocation::new(35.0 + meters / 111_320.0, 139.0).unwrap()
    }

    fn stop(id: &str, meters: f64) -> Place {
        Place::new(id, id, north(meters), vec!["museum".into()])
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.provider_id.as_str()).collect()
    }

    #[test]
    fn nearest_neighbor_walks_outward() {
        let ordered = order_nearest_neighbor(
            &north(0.0),
            vec![stop("far", 900.0), stop("near", 100.0), stop("mid", 400.0)],
        );
        assert_eq!(ids(&ordered), vec!["near", "mid", "far"]);
    }

    #[test]
    fn nearest_neighbor_ties_keep_insertion_order() {
        let ordered = order_nearest_neighbor(
            &north(0.0),
            vec![stop("south", -300.0), stop("north", 300.0)],
        );
        assert_eq!(ordered[0].provider_id, "south");
    }

    #[test]
    fn total_includes_travel_and_stay() {
        let registry = CategoryRegistry::standard();
        let stops = vec![stop("a", 800.0), stop("b", 1600.0)];
        let legs = leg_minutes(&north(0.0), &stops, 80.0);
        assert_eq!(legs.len(), 2);
        // ~800 m per leg at 80 m/min.
        assert!(legs.iter().all(|&m| (9..=10).contains(&m)), "{legs:?}");
        let total = total_minutes(&north(0.0), &stops, &registry, 80.0);
        assert_eq!(total, legs.iter().sum::<u32>() + 120);
    }

    #[test]
    fn schedule_and_opening_hours() {
        let registry = CategoryRegistry::standard();
        let at = |hh, mm| {
            NaiveDate::from_ymd_opt(2024, 6, 5)
                .unwrap()
                .and_hms_opt(hh, mm, 0)
                .unwrap()
        };
        let departure = at(15, 0);
        let closes_at_five = OpeningHours::daily(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        let first = stop("first", 0.0).with_opening_hours(closes_at_five.clone());
        let second = stop("second", 400.0).with_opening_hours(closes_at_five);
        let stops = [first.clone(), second.clone()];

        let times = schedule(&north(0.0), &stops, departure, &registry, 80.0);
        let legs = leg_minutes(&north(0.0), &stops, 80.0);
        assert_eq!(times[0].0, departure);
        assert_eq!(times[0].1, departure + Duration::minutes(60));
        assert_eq!(times[1].0, times[0].1 + Duration::minutes(i64::from(legs[1])));
        assert!(legs[1] > 0);

        assert!(open_throughout(&north(0.0), &[first.clone()], departure, &registry, 80.0));
        // The second museum would still be visited after 17:00.
        assert!(!open_throughout(&north(0.0), &[first.clone(), second], departure, &registry, 80.0));

        // A 60 minute visit may end at 16:59 but not at closing time.
        assert!(open_throughout(&north(0.0), &[first.clone()], at(15, 59), &registry, 80.0));
        assert!(!open_throughout(&north(0.0), &[first], at(16, 0), &registry, 80.0));
    }

    #[test]
    fn totals_saturate_at_absurd_speeds() {
        let registry = CategoryRegistry::standard();
        let stops = vec![stop("a", 1000.0), stop("b", 2000.0)];
        let legs = leg_minutes(&north(0.0), &stops, 1e-7);
        assert!(legs.iter().all(|&m| m == u32::MAX), "{legs:?}");
        assert_eq!(total_minutes(&north(0.0), &stops, &registry, 1e-7), u32::MAX);
    }
}
