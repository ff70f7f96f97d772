//! Candidate places and the data attached to them by enrichment.

mod hours;

pub use hours::{OpeningHours, OpeningPeriod, WeekTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::{Category, CategoryRegistry};
use crate::geo::GeoLocation;

/// Provider tags marking a building or establishment (as opposed to an
/// area such as a locality or a route).
pub const BUILDING_TYPES: &[&str] = &["establishment", "premise", "subpremise", "point_of_interest"];

/// A fetched photo URL with its pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Requested photo dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
}

impl PhotoSize {
    pub const SMALL: PhotoSize = PhotoSize {
        width: 400,
        height: 400,
    };
    pub const LARGE: PhotoSize = PhotoSize {
        width: 1000,
        height: 1000,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Detail data returned by the provider's detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub photo_references: Vec<String>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

/// A point of interest returned by the search provider.
///
/// `photos`, `reviews`, `price_level`, and `detail` stay empty until the
/// enrichment phase fills them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: Uuid,
    pub provider_id: String,
    pub name: String,
    pub location: GeoLocation,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub photo_references: Vec<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub detail: Option<PlaceDetail>,
}

impl Place {
    /// A bare place with a fresh internal id.
    pub fn new(
        provider_id: impl Into<String>,
        name: impl Into<String>,
        location: GeoLocation,
        types: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id: provider_id.into(),
            name: name.into(),
            location,
            types,
            rating: 0.0,
            rating_count: 0,
            price_level: None,
            opening_hours: None,
            photo_references: Vec::new(),
            photos: Vec::new(),
            reviews: Vec::new(),
            detail: None,
        }
    }

    pub fn with_rating(mut self, rating: f64, rating_count: u32) -> Self {
        self.rating = rating;
        self.rating_count = rating_count;
        self
    }

    pub fn with_opening_hours(mut self, hours: OpeningHours) -> Self {
        self.opening_hours = Some(hours);
        self
    }

    pub fn with_photo_references(mut self, references: Vec<String>) -> Self {
        self.photo_references = references;
        self
    }

    /// Registered categories of this place, in registration order.
    pub fn categories<'r>(&self, registry: &'r CategoryRegistry) -> Vec<&'r Category> {
        registry.categories_of(&self.types)
    }

    pub fn main_category<'r>(&self, registry: &'r CategoryRegistry) -> Option<&'r Category> {
        registry.main_category(&self.types)
    }

    pub fn stay_minutes(&self, registry: &CategoryRegistry) -> u32 {
        registry.stay_minutes(&self.types)
    }

    /// Whether the place is a building or establishment.
    pub fn is_building(&self) -> bool {
        self.types
            .iter()
            .any(|t| BUILDING_TYPES.contains(&t.as_str()))
    }

    /// Whether a photo has been fetched or can be fetched.
    pub fn has_photo_source(&self) -> bool {
        !self.photos.is_empty()
            || !self.photo_references.is_empty()
            || self
                .detail
                .as_ref()
                .is_some_and(|d| !d.photo_references.is_empty())
    }

    /// Opening hours from the search result, else from fetched detail.
    pub fn hours(&self) -> Option<&OpeningHours> {
        self.opening_hours
            .as_ref()
            .or_else(|| self.detail.as_ref().and_then(|d| d.opening_hours.as_ref()))
    }
}
