//! Finished plans: an itinerary with a title and per-leg travel times.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoLocation;
use crate::itinerary::Itinerary;
use crate::itinerary::route::leg_minutes;
use crate::place::Place;

/// One walking leg. `from` is `None` for the leg leaving the start location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Option<Uuid>,
    pub to: Uuid,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub title: String,
    pub places: Vec<Place>,
    pub time_in_minutes: u32,
    pub transitions: Vec<Transition>,
}

impl Plan {
    /// Assemble a plan from a finished itinerary.
    pub fn from_itinerary(
        itinerary: Itinerary,
        title: String,
        start: &GeoLocation,
        speed_meters_per_minute: f64,
    ) -> Self {
        let legs = leg_minutes(start, &itinerary.places, speed_meters_per_minute);
        let transitions = itinerary
            .places
            .iter()
            .enumerate()
            .zip(legs)
            .map(|((index, place), duration_minutes)| Transition {
                from: index.checked_sub(1).map(|prev| itinerary.places[prev].id),
                to: place.id,
                duration_minutes,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            title,
            time_in_minutes: itinerary.total_minutes,
            places: itinerary.places,
            transitions,
        }
    }

    /// Travel minutes over all legs.
    pub fn travel_minutes(&self) -> u32 {
        self.transitions
            .iter()
            .map(|t| t.duration_minutes)
            .fold(0, u32::saturating_add)
    }
}
