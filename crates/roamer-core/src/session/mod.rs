//! Plan candidate sessions: generated plans plus the search results they
//! were built from, kept for a bounded time.

mod memory;
mod postgres;
mod sweep;

pub use memory::InMemorySessionStore;
pub use postgres::PgSessionStore;
pub use sweep::{SweepReport, run_sweeper, sweep_expired};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoLocation;
use crate::place::Place;
use crate::plan::Plan;

/// How long a session lives by default, in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Request context recorded with a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub start_location: Option<GeoLocation>,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
    #[serde(default)]
    pub disliked_categories: Vec<String>,
    pub free_time_minutes: Option<u32>,
    #[serde(default)]
    pub created_based_on_current_location: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCandidateSession {
    pub id: Uuid,
    pub meta: SessionMeta,
    pub plans: Vec<Plan>,
    pub search_results: Vec<Place>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PlanCandidateSession {
    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("plan candidate session {0} not found")]
    NotFound(Uuid),

    #[error("plan candidate session {id} expired at {expired_at}")]
    Expired { id: Uuid, expired_at: DateTime<Utc> },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Storage for plan candidate sessions.
///
/// Appends never reorder what is already stored. `delete` removes cached
/// search results and plans before the session itself, atomically.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session expiring `ttl` from now.
    async fn create(&self, id: Uuid, meta: SessionMeta, ttl: Duration) -> Result<PlanCandidateSession, StoreError>;

    /// Load a session, failing with `Expired` when `now` is past its expiry.
    async fn find(&self, id: Uuid, now: DateTime<Utc>) -> Result<PlanCandidateSession, StoreError>;

    async fn add_plans(&self, id: Uuid, plans: &[Plan]) -> Result<(), StoreError>;

    /// Append places to the search cache. Places already cached under the
    /// same provider id are left untouched.
    async fn add_search_results(&self, id: Uuid, places: &[Place]) -> Result<(), StoreError>;

    /// Replace cached places by provider id; returns how many were replaced.
    async fn update_search_results(&self, id: Uuid, places: &[Place]) -> Result<usize, StoreError>;

    /// Ids of sessions with `expires_at <= cutoff`, oldest first.
    async fn find_expired_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError>;

    /// Delete a session and everything attached to it. Returns whether the
    /// session existed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn SessionStore) {}
};
