//! End-to-end plan generation.
//!
//! search (or session cache) → filter → anchors → itineraries →
//! enrichment → photo check → titles → plans stored on the session.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::anchor::{AnchorOptions, select_anchors};
use crate::category::CategoryRegistry;
use crate::config::PlannerConfig;
use crate::enrich::{Enricher, EnrichmentKind};
use crate::filter::{FilterPipeline, with_photos};
use crate::geo::GeoLocation;
use crate::itinerary::{Itinerary, ItineraryBuilder, ItineraryRequest, build_all};
use crate::place::Place;
use crate::plan::Plan;
use crate::provider::{PlaceProvider, SearchService, default_search_types};
use crate::session::{PlanCandidateSession, SessionMeta, SessionStore, StoreError};
use crate::title::{TitleGenerator, build_prompt, generate_title};

/// One plan-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Reuse this session's cached search results when it exists; a new
    /// session with this id is created otherwise.
    pub session_id: Option<Uuid>,
    pub start: GeoLocation,
    pub preferred_categories: Vec<String>,
    pub disliked_categories: Vec<String>,
    pub free_time_minutes: Option<u32>,
    /// Local departure time when the user is leaving now.
    pub departure: Option<NaiveDateTime>,
    /// Provider id of a place that must anchor the first plan.
    pub must_include: Option<String>,
    pub created_based_on_current_location: bool,
}

impl PlanRequest {
    pub fn new(start: GeoLocation) -> Self {
        Self {
            session_id: None,
            start,
            preferred_categories: Vec::new(),
            disliked_categories: Vec::new(),
            free_time_minutes: None,
            departure: None,
            must_include: None,
            created_based_on_current_location: false,
        }
    }

    fn meta(&self) -> SessionMeta {
        SessionMeta {
            start_location: Some(self.start),
            preferred_categories: self.preferred_categories.clone(),
            disliked_categories: self.disliked_categories.clone(),
            free_time_minutes: self.free_time_minutes,
            created_based_on_current_location: self.created_based_on_current_location,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("no candidate places passed filtering")]
    NoEligibleCandidates,

    #[error("no plan could be built from the candidate places")]
    NoPlansGenerated,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Plans created for a session by one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlans {
    pub session_id: Uuid,
    pub plans: Vec<Plan>,
}

pub struct PlanGenerator {
    registry: Arc<CategoryRegistry>,
    provider: Arc<dyn PlaceProvider>,
    titles: Arc<dyn TitleGenerator>,
    store: Arc<dyn SessionStore>,
    config: PlannerConfig,
    search_types: Vec<Option<String>>,
}

impl PlanGenerator {
    pub fn new(
        registry: Arc<CategoryRegistry>,
        provider: Arc<dyn PlaceProvider>,
        titles: Arc<dyn TitleGenerator>,
        store: Arc<dyn SessionStore>,
        config: PlannerConfig,
    ) -> Self {
        let search_types = default_search_types(&registry);
        Self {
            registry,
            provider,
            titles,
            store,
            config,
            search_types,
        }
    }

    /// Replace the per-type nearby searches run for a new session.
    pub fn with_search_types(mut self, types: Vec<Option<String>>) -> Self {
        self.search_types = types;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Generate plans and append them to the request's session.
    pub async fn create_plans(
        &self,
        request: &PlanRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedPlans, PlanError> {
        let session = self.open_session(request).await?;
        let session_id = session.id;

        let raw = if session.search_results.is_empty() {
            let found = SearchService::new(self.provider.clone(), self.search_types.clone())
                .search_nearby(request.start, self.config.search_radius_meters, cancel)
                .await;
            self.store.add_search_results(session_id, &found).await?;
            found
        } else {
            info!(session_id = %session_id, places = session.search_results.len(), "reusing cached search results");
            session.search_results
        };

        let mut pipeline = FilterPipeline::new()
            .preferred_categories(request.preferred_categories.clone())
            .rejected_categories(request.disliked_categories.clone())
            .distance_range(request.start, 0.0, self.config.search_radius_meters);
        if self.config.min_rating > 0.0 || self.config.min_rating_count > 0 {
            pipeline = pipeline.min_rating(self.config.min_rating, self.config.min_rating_count);
        }
        let pool = pipeline.apply(&raw, &self.registry);
        if pool.is_empty() {
            return Err(PlanError::NoEligibleCandidates);
        }

        let anchors = select_anchors(
            &pool,
            &self.registry,
            &AnchorOptions {
                count: self.config.anchor_count,
                min_separation_meters: self.config.anchor_separation_meters,
                disliked_categories: request.disliked_categories.clone(),
                open_at: request.departure,
                must_include: request.must_include.clone(),
            },
        );
        info!(session_id = %session_id, pool = pool.len(), anchors = anchors.len(), "anchors selected");

        let itinerary_request = ItineraryRequest {
            start: request.start,
            free_time_minutes: request.free_time_minutes,
            departure: request.departure,
        };
        let builder = Arc::new(ItineraryBuilder::new(
            self.registry.clone(),
            self.config.itinerary_config(),
        ));
        let itineraries = match build_all(
            builder.clone(),
            itinerary_request.clone(),
            anchors,
            Arc::new(pool),
            self.config.claim_strategy,
            cancel,
        )
        .await
        {
            Ok(built) if !built.is_empty() => built,
            Ok(_) => return Err(PlanError::NoPlansGenerated),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "itinerary building failed");
                return Err(PlanError::NoPlansGenerated);
            }
        };

        let itineraries = self.enrich(session_id, itineraries, cancel).await;
        let itineraries = drop_photoless_stops(&builder, &itinerary_request, itineraries);
        if itineraries.is_empty() {
            return Err(PlanError::NoPlansGenerated);
        }
        let plans = self.assemble(request, itineraries).await;
        self.store.add_plans(session_id, &plans).await?;

        info!(session_id = %session_id, plans = plans.len(), "plans created");
        Ok(GeneratedPlans { session_id, plans })
    }

    /// Plans stored on a live session.
    pub async fn plans_for_session(&self, session_id: Uuid) -> Result<Vec<Plan>, PlanError> {
        Ok(self.store.find(session_id, Utc::now()).await?.plans)
    }

    async fn open_session(&self, request: &PlanRequest) -> Result<PlanCandidateSession, PlanError> {
        let ttl = self.config.session_ttl();
        let Some(id) = request.session_id else {
            return Ok(self.store.create(Uuid::new_v4(), request.meta(), ttl).await?);
        };
        match self.store.find(id, Utc::now()).await {
            Ok(session) => Ok(session),
            Err(StoreError::NotFound(_)) => Ok(self.store.create(id, request.meta(), ttl).await?),
            Err(e) => Err(e.into()),
        }
    }

    /// Enrich every itinerary stop in one batch and cache the results.
    async fn enrich(
        &self,
        session_id: Uuid,
        itineraries: Vec<Itinerary>,
        cancel: &CancellationToken,
    ) -> Vec<Itinerary> {
        let sizes: Vec<usize> = itineraries.iter().map(|i| i.places.len()).collect();
        let mut stops: Vec<Place> = Vec::with_capacity(sizes.iter().sum());
        let mut shells = Vec::with_capacity(itineraries.len());
        for mut itinerary in itineraries {
            stops.append(&mut itinerary.places);
            shells.push(itinerary);
        }

        let enricher = Enricher::new(self.provider.clone())
            .with_max_concurrency(self.config.enrichment_concurrency);
        if let Err(e) = enricher
            .enrich_and_cache(
                self.store.as_ref(),
                session_id,
                &mut stops,
                &EnrichmentKind::ALL,
                cancel,
            )
            .await
        {
            warn!(session_id = %session_id, error = %e, "failed to cache enriched places");
        }

        let mut stops = stops.into_iter();
        for (shell, size) in shells.iter_mut().zip(sizes) {
            shell.places = stops.by_ref().take(size).collect();
        }
        shells
    }

    async fn assemble(&self, request: &PlanRequest, itineraries: Vec<Itinerary>) -> Vec<Plan> {
        let timeout = self.config.title_timeout();
        let titles = futures::future::join_all(itineraries.iter().map(|itinerary| {
            let fallback = itinerary
                .anchor()
                .map(|a| a.name.clone())
                .unwrap_or_default();
            let prompt = build_prompt(&itinerary.places, &self.registry);
            let generator = self.titles.clone();
            async move { generate_title(generator.as_ref(), &prompt, &fallback, timeout).await }
        }))
        .await;

        itineraries
            .into_iter()
            .zip(titles)
            .map(|(itinerary, title)| {
                Plan::from_itinerary(
                    itinerary,
                    title,
                    &request.start,
                    self.config.walking_speed_meters_per_minute,
                )
            })
            .collect()
    }
}

/// Drop stops that still have no photo source once enrichment has run.
///
/// An itinerary whose anchor has none is dropped whole; the others are
/// re-ordered and re-timed without the removed stops.
fn drop_photoless_stops(
    builder: &ItineraryBuilder,
    request: &ItineraryRequest,
    itineraries: Vec<Itinerary>,
) -> Vec<Itinerary> {
    itineraries
        .into_iter()
        .filter_map(|itinerary| {
            if !itinerary.anchor().is_some_and(Place::has_photo_source) {
                debug!(anchor = %itinerary.anchor_provider_id, "dropping itinerary without anchor photo");
                return None;
            }
            if itinerary.places.iter().all(Place::has_photo_source) {
                return Some(itinerary);
            }
            let Itinerary {
                anchor_provider_id,
                places,
                ..
            } = itinerary;
            Some(builder.finish(request, anchor_provider_id, with_photos(&places)))
        })
        .collect()
}
