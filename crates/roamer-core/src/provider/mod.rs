//! The place-search provider contract.
//!
//! A provider is the external service that knows about places: nearby
//! search, detail lookups, photos, and price levels. The engine only talks
//! to it through [`PlaceProvider`], so tests and embedders can plug in any
//! backend.

mod search;

pub use search::{SearchService, default_search_types};

use anyhow::Result;
use async_trait::async_trait;

use crate::geo::GeoLocation;
use crate::place::{Photo, PhotoSize, Place, PlaceDetail};

/// Adapter interface for an external place-search service.
///
/// # Object Safety
///
/// Every method returns a concrete type, so the trait can be shared as
/// `Arc<dyn PlaceProvider>` across spawned tasks.
#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Places within `radius_meters` of `location`, optionally restricted
    /// to one provider type tag.
    async fn search_nearby(
        &self,
        location: GeoLocation,
        radius_meters: f64,
        type_filter: Option<&str>,
    ) -> Result<Vec<Place>>;

    /// Reviews, photo references, and opening hours of one place.
    async fn fetch_detail(&self, provider_id: &str) -> Result<PlaceDetail>;

    /// Photo URLs of one place, one per requested size.
    async fn fetch_photos(&self, provider_id: &str, sizes: &[PhotoSize]) -> Result<Vec<Photo>>;

    /// Price level (0-4) of one place, when the provider knows it.
    async fn fetch_price_level(&self, provider_id: &str) -> Result<Option<u8>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlaceProvider) {}
};
