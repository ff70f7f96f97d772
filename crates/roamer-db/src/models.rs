use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// A row from `plan_candidate_sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub preferred_categories: Vec<String>,
    pub disliked_categories: Vec<String>,
    pub free_time_minutes: Option<i32>,
    pub created_based_on_current_location: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Values needed to insert a session row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub id: Uuid,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub preferred_categories: Vec<String>,
    pub disliked_categories: Vec<String>,
    pub free_time_minutes: Option<i32>,
    pub created_based_on_current_location: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// A row from `plan_candidate_plans`. `places` and `transitions` hold the
/// serialized domain values.
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub position: i32,
    pub title: String,
    pub time_in_minutes: i32,
    pub places: Json<serde_json::Value>,
    pub transitions: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Values needed to append a plan to a session.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub id: Uuid,
    pub title: String,
    pub time_in_minutes: i32,
    pub places: serde_json::Value,
    pub transitions: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Cached search results
// ---------------------------------------------------------------------------

/// A row from `plan_candidate_search_results`.
#[derive(Debug, Clone, FromRow)]
pub struct SearchResultRow {
    pub seq: i64,
    pub session_id: Uuid,
    pub provider_id: String,
    pub place: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cached place payload keyed by its provider id.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPlace {
    pub provider_id: String,
    pub place: serde_json::Value,
}
