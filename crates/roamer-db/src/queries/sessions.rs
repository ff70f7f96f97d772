//! Database query functions for the `plan_candidate_sessions` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewSession, SessionRow};

/// Insert a new session row and return it.
pub async fn insert_session(pool: &PgPool, session: &NewSession) -> Result<SessionRow> {
    let row = sqlx::query_as::<_, SessionRow>(
        "INSERT INTO plan_candidate_sessions \
         (id, start_latitude, start_longitude, preferred_categories, disliked_categories, \
          free_time_minutes, created_based_on_current_location, created_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(session.id)
    .bind(session.start_latitude)
    .bind(session.start_longitude)
    .bind(&session.preferred_categories)
    .bind(&session.disliked_categories)
    .bind(session.free_time_minutes)
    .bind(session.created_based_on_current_location)
    .bind(session.created_at)
    .bind(session.expires_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert session {}", session.id))?;

    Ok(row)
}

/// Fetch a session by its ID, expired or not.
pub async fn get_session(pool: &PgPool, id: Uuid) -> Result<Option<SessionRow>> {
    let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM plan_candidate_sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch session")?;

    Ok(row)
}

/// List sessions whose `expires_at` is at or before `cutoff`, oldest first.
pub async fn list_expired_sessions(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<SessionRow>> {
    let rows = sqlx::query_as::<_, SessionRow>(
        "SELECT * FROM plan_candidate_sessions \
         WHERE expires_at <= $1 \
         ORDER BY expires_at, id",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
    .context("failed to list expired sessions")?;

    Ok(rows)
}

/// Delete a session together with its plans and cached search results.
///
/// Dependent rows go first, all inside one transaction, so a failure never
/// leaves an orphaned cache or a session without its cache. Returns `false`
/// when the session did not exist.
pub async fn delete_session_cascade(pool: &PgPool, id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query("DELETE FROM plan_candidate_search_results WHERE session_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to delete search results of session {id}"))?;

    sqlx::query("DELETE FROM plan_candidate_plans WHERE session_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to delete plans of session {id}"))?;

    let result = sqlx::query("DELETE FROM plan_candidate_sessions WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to delete session {id}"))?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(result.rows_affected() > 0)
}
