//! Database query functions for the `plan_candidate_search_results` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{CachedPlace, SearchResultRow};

/// Append search results to a session's cache.
///
/// A provider id already cached for the session is left untouched.
pub async fn insert_search_results(
    pool: &PgPool,
    session_id: Uuid,
    places: &[CachedPlace],
) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    for cached in places {
        sqlx::query(
            "INSERT INTO plan_candidate_search_results (session_id, provider_id, place) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (session_id, provider_id) DO NOTHING",
        )
        .bind(session_id)
        .bind(&cached.provider_id)
        .bind(Json(&cached.place))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to cache search result {:?}", cached.provider_id))?;
    }

    tx.commit().await.context("failed to commit transaction")?;
    Ok(())
}

/// Replace the cached payload of places already in a session's cache.
///
/// Returns the number of rows updated; unknown provider ids are skipped.
pub async fn update_search_results(
    pool: &PgPool,
    session_id: Uuid,
    places: &[CachedPlace],
) -> Result<u64> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let mut updated = 0;

    for cached in places {
        let result = sqlx::query(
            "UPDATE plan_candidate_search_results \
             SET place = $3, updated_at = now() \
             WHERE session_id = $1 AND provider_id = $2",
        )
        .bind(session_id)
        .bind(&cached.provider_id)
        .bind(Json(&cached.place))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update search result {:?}", cached.provider_id))?;
        updated += result.rows_affected();
    }

    tx.commit().await.context("failed to commit transaction")?;
    Ok(updated)
}

/// List the cached search results of a session in insertion order.
pub async fn list_search_results(pool: &PgPool, session_id: Uuid) -> Result<Vec<SearchResultRow>> {
    let rows = sqlx::query_as::<_, SearchResultRow>(
        "SELECT * FROM plan_candidate_search_results WHERE session_id = $1 ORDER BY seq",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("failed to list search results")?;

    Ok(rows)
}
