//! Database query functions for the `plan_candidate_plans` table.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{NewPlan, PlanRow};

/// Append plans to a session, after any plans it already holds.
///
/// The session row is locked for the rest of the transaction, so concurrent
/// appends to one session take turns and positions stay unique.
pub async fn append_plans(pool: &PgPool, session_id: Uuid, plans: &[NewPlan]) -> Result<()> {
    if plans.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let locked: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM plan_candidate_sessions WHERE id = $1 FOR UPDATE")
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await
            .context("failed to lock session")?;
    if locked.is_none() {
        bail!("session {session_id} not found");
    }

    let (last,): (Option<i32>,) =
        sqlx::query_as("SELECT MAX(position) FROM plan_candidate_plans WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&mut *tx)
            .await
            .context("failed to read last plan position")?;
    let mut position = last.map_or(0, |p| p + 1);

    for plan in plans {
        sqlx::query(
            "INSERT INTO plan_candidate_plans \
             (id, session_id, position, title, time_in_minutes, places, transitions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(plan.id)
        .bind(session_id)
        .bind(position)
        .bind(&plan.title)
        .bind(plan.time_in_minutes)
        .bind(Json(&plan.places))
        .bind(Json(&plan.transitions))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert plan {}", plan.id))?;
        position += 1;
    }

    tx.commit().await.context("failed to commit transaction")?;
    Ok(())
}

/// List the plans of a session in insertion order.
pub async fn list_plans_for_session(pool: &PgPool, session_id: Uuid) -> Result<Vec<PlanRow>> {
    let rows = sqlx::query_as::<_, PlanRow>(
        "SELECT * FROM plan_candidate_plans WHERE session_id = $1 ORDER BY position",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans for session")?;

    Ok(rows)
}
