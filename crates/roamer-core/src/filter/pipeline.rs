//! Ordered composition of the place filters.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::category::{Category, CategoryRegistry};
use crate::geo::GeoLocation;
use crate::place::Place;

use super::{
    exclude_categories, exclude_ignored_categories, exclude_organizations, keep_categories,
    open_at, remove_duplicates, with_min_rating, with_photos, within_distance_range,
};

/// Minimum rating and rating count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingThreshold {
    pub min_rating: f64,
    pub min_count: u32,
}

/// One stage of a [`FilterPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStep {
    RemoveDuplicates,
    ExcludeIgnored,
    /// Keep these categories; empty means every registered category.
    KeepCategories(Vec<String>),
    ExcludeCategories(Vec<String>),
    ExcludeOrganizations,
    DistanceRange {
        reference: GeoLocation,
        start_meters: f64,
        end_meters: f64,
    },
    OpenAt(NaiveDateTime),
    WithPhotos,
    MinRating(RatingThreshold),
}

impl FilterStep {
    fn name(&self) -> &'static str {
        match self {
            Self::RemoveDuplicates => "remove_duplicates",
            Self::ExcludeIgnored => "exclude_ignored",
            Self::KeepCategories(_) => "keep_categories",
            Self::ExcludeCategories(_) => "exclude_categories",
            Self::ExcludeOrganizations => "exclude_organizations",
            Self::DistanceRange { .. } => "distance_range",
            Self::OpenAt(_) => "open_at",
            Self::WithPhotos => "with_photos",
            Self::MinRating(_) => "min_rating",
        }
    }

    /// Run this step alone.
    pub fn apply(&self, places: &[Place], registry: &CategoryRegistry) -> Vec<Place> {
        match self {
            Self::RemoveDuplicates => remove_duplicates(places),
            Self::ExcludeIgnored => exclude_ignored_categories(places, registry),
            Self::KeepCategories(names) => {
                let allowed: Vec<&Category> = if names.is_empty() {
                    registry.categories().iter().collect()
                } else {
                    registry.resolve(names)
                };
                keep_categories(places, &allowed)
            }
            Self::ExcludeCategories(names) => exclude_categories(places, &registry.resolve(names)),
            Self::ExcludeOrganizations => exclude_organizations(places),
            Self::DistanceRange {
                reference,
                start_meters,
                end_meters,
            } => within_distance_range(places, reference, *start_meters, *end_meters),
            Self::OpenAt(at) => open_at(places, *at),
            Self::WithPhotos => with_photos(places),
            Self::MinRating(t) => with_min_rating(places, t.min_rating, t.min_count),
        }
    }
}

/// The conventional narrowing of a raw search pool.
///
/// Cheap identity and category checks run before geometry, opening hours,
/// photos, and rating. Optional stages are skipped when unset.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    preferred_categories: Vec<String>,
    rejected_categories: Vec<String>,
    distance: Option<(GeoLocation, f64, f64)>,
    open_at: Option<NaiveDateTime>,
    require_photo: bool,
    rating: Option<RatingThreshold>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to these categories instead of every registered one.
    pub fn preferred_categories(mut self, names: Vec<String>) -> Self {
        self.preferred_categories = names;
        self
    }

    pub fn rejected_categories(mut self, names: Vec<String>) -> Self {
        self.rejected_categories = names;
        self
    }

    pub fn distance_range(mut self, reference: GeoLocation, start_meters: f64, end_meters: f64) -> Self {
        self.distance = Some((reference, start_meters, end_meters));
        self
    }

    pub fn open_at(mut self, at: NaiveDateTime) -> Self {
        self.open_at = Some(at);
        self
    }

    pub fn require_photo(mut self, require: bool) -> Self {
        self.require_photo = require;
        self
    }

    pub fn min_rating(mut self, min_rating: f64, min_count: u32) -> Self {
        self.rating = Some(RatingThreshold {
            min_rating,
            min_count,
        });
        self
    }

    /// The stages this pipeline runs, in order.
    pub fn steps(&self) -> Vec<FilterStep> {
        let mut steps = vec![
            FilterStep::RemoveDuplicates,
            FilterStep::ExcludeIgnored,
            FilterStep::KeepCategories(self.preferred_categories.clone()),
        ];
        if !self.rejected_categories.is_empty() {
            steps.push(FilterStep::ExcludeCategories(self.rejected_categories.clone()));
        }
        steps.push(FilterStep::ExcludeOrganizations);
        if let Some((reference, start_meters, end_meters)) = self.distance {
            steps.push(FilterStep::DistanceRange {
                reference,
                start_meters,
                end_meters,
            });
        }
        if let Some(at) = self.open_at {
            steps.push(FilterStep::OpenAt(at));
        }
        if self.require_photo {
            steps.push(FilterStep::WithPhotos);
        }
        if let Some(threshold) = self.rating {
            steps.push(FilterStep::MinRating(threshold));
        }
        steps
    }

    pub fn apply(&self, places: &[Place], registry: &CategoryRegistry) -> Vec<Place> {
        let mut current = places.to_vec();
        for step in self.steps() {
            let before = current.len();
            current = step.apply(&current, registry);
            debug!(step = step.name(), before, after = current.len(), "filter applied");
            if current.is_empty() {
                break;
            }
        }
        current
    }
}
