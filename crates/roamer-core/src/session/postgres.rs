//! PostgreSQL-backed session store.
//!
//! Places and plans are stored as JSONB; session metadata is stored in
//! columns so expiry sweeps can run as plain SQL.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use roamer_db::models::{CachedPlace, NewPlan, NewSession, PlanRow, SessionRow};
use roamer_db::queries::{plans as plan_db, search_results as search_db, sessions as session_db};

use super::{PlanCandidateSession, SessionMeta, SessionStore, StoreError};
use crate::geo::GeoLocation;
use crate::place::Place;
use crate::plan::{Plan, Transition};

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn require_session(&self, id: Uuid) -> Result<SessionRow, StoreError> {
        session_db::get_session(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }
}

// ---------------------------------------------------------------------------
// Row conversions
// ---------------------------------------------------------------------------

fn meta_from_row(row: &SessionRow) -> anyhow::Result<SessionMeta> {
    let start_location = match (row.start_latitude, row.start_longitude) {
        (Some(latitude), Some(longitude)) => Some(
            GeoLocation::new(latitude, longitude)
                .with_context(|| format!("session {} has an invalid start location", row.id))?,
        ),
        _ => None,
    };
    let free_time_minutes = row
        .free_time_minutes
        .map(u32::try_from)
        .transpose()
        .with_context(|| format!("session {} has a negative free time", row.id))?;

    Ok(SessionMeta {
        start_location,
        preferred_categories: row.preferred_categories.clone(),
        disliked_categories: row.disliked_categories.clone(),
        free_time_minutes,
        created_based_on_current_location: row.created_based_on_current_location,
    })
}

fn plan_from_row(row: PlanRow) -> anyhow::Result<Plan> {
    let places: Vec<Place> = serde_json::from_value(row.places.0)
        .with_context(|| format!("failed to decode places of plan {}", row.id))?;
    let transitions: Vec<Transition> = serde_json::from_value(row.transitions.0)
        .with_context(|| format!("failed to decode transitions of plan {}", row.id))?;
    Ok(Plan {
        id: row.id,
        title: row.title,
        places,
        time_in_minutes: u32::try_from(row.time_in_minutes)
            .with_context(|| format!("plan {} has a negative duration", row.id))?,
        transitions,
    })
}

fn plan_to_row(plan: &Plan) -> anyhow::Result<NewPlan> {
    Ok(NewPlan {
        id: plan.id,
        title: plan.title.clone(),
        time_in_minutes: i32::try_from(plan.time_in_minutes)
            .with_context(|| format!("plan {} duration out of range", plan.id))?,
        places: serde_json::to_value(&plan.places).context("failed to encode plan places")?,
        transitions: serde_json::to_value(&plan.transitions)
            .context("failed to encode plan transitions")?,
    })
}

fn cached_places(places: &[Place]) -> anyhow::Result<Vec<CachedPlace>> {
    places
        .iter()
        .map(|place| {
            Ok(CachedPlace {
                provider_id: place.provider_id.clone(),
                place: serde_json::to_value(place)
                    .with_context(|| format!("failed to encode place {:?}", place.provider_id))?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, id: Uuid, meta: SessionMeta, ttl: Duration) -> Result<PlanCandidateSession, StoreError> {
        let now = Utc::now();
        let free_time_minutes = meta
            .free_time_minutes
            .map(i32::try_from)
            .transpose()
            .context("free time out of range")?;
        let new = NewSession {
            id,
            start_latitude: meta.start_location.map(|l| l.latitude),
            start_longitude: meta.start_location.map(|l| l.longitude),
            preferred_categories: meta.preferred_categories.clone(),
            disliked_categories: meta.disliked_categories.clone(),
            free_time_minutes,
            created_based_on_current_location: meta.created_based_on_current_location,
            created_at: now,
            expires_at: now + ttl,
        };
        let row = session_db::insert_session(&self.pool, &new).await?;
        tracing::debug!(session_id = %id, expires_at = %row.expires_at, "session created");

        Ok(PlanCandidateSession {
            id: row.id,
            meta,
            plans: Vec::new(),
            search_results: Vec::new(),
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }

    async fn find(&self, id: Uuid, now: DateTime<Utc>) -> Result<PlanCandidateSession, StoreError> {
        let row = self.require_session(id).await?;
        if row.expires_at <= now {
            return Err(StoreError::Expired {
                id,
                expired_at: row.expires_at,
            });
        }

        let meta = meta_from_row(&row)?;
        let plans = plan_db::list_plans_for_session(&self.pool, id)
            .await?
            .into_iter()
            .map(plan_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let search_results = search_db::list_search_results(&self.pool, id)
            .await?
            .into_iter()
            .map(|r| {
                serde_json::from_value::<Place>(r.place.0)
                    .with_context(|| format!("failed to decode cached place {:?}", r.provider_id))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(PlanCandidateSession {
            id,
            meta,
            plans,
            search_results,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }

    async fn add_plans(&self, id: Uuid, plans: &[Plan]) -> Result<(), StoreError> {
        self.require_session(id).await?;
        let rows = plans.iter().map(plan_to_row).collect::<anyhow::Result<Vec<_>>>()?;
        plan_db::append_plans(&self.pool, id, &rows).await?;
        Ok(())
    }

    async fn add_search_results(&self, id: Uuid, places: &[Place]) -> Result<(), StoreError> {
        self.require_session(id).await?;
        search_db::insert_search_results(&self.pool, id, &cached_places(places)?).await?;
        Ok(())
    }

    async fn update_search_results(&self, id: Uuid, places: &[Place]) -> Result<usize, StoreError> {
        self.require_session(id).await?;
        let updated = search_db::update_search_results(&self.pool, id, &cached_places(places)?).await?;
        usize::try_from(updated).map_err(|e| StoreError::Backend(anyhow!(e)))
    }

    async fn find_expired_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let rows = session_db::list_expired_sessions(&self.pool, cutoff).await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(session_db::delete_session_cascade(&self.pool, id).await?)
    }
}
