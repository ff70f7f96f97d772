//! Removal of expired sessions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{SessionStore, StoreError};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: Vec<Uuid>,
    /// Sessions that disappeared between listing and deletion.
    pub missing: usize,
    pub failed: usize,
}

/// Delete every session with `expires_at <= cutoff`.
///
/// A failed delete is logged and counted; the sweep carries on with the
/// remaining sessions.
pub async fn sweep_expired(store: &dyn SessionStore, cutoff: DateTime<Utc>) -> Result<SweepReport, StoreError> {
    let expired = store.find_expired_before(cutoff).await?;
    let mut report = SweepReport::default();

    for id in expired {
        match store.delete(id).await {
            Ok(true) => report.deleted.push(id),
            Ok(false) => report.missing += 1,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "failed to delete expired session");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        cutoff = %cutoff,
        deleted = report.deleted.len(),
        missing = report.missing,
        failed = report.failed,
        "expired session sweep complete"
    );
    Ok(report)
}

/// Sweep every `interval` until `cancel` fires. The first sweep runs
/// immediately; a failed sweep is logged and retried on the next tick.
pub async fn run_sweeper(store: &dyn SessionStore, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("session sweeper stopped");
                return;
            }
            _ = ticker.tick() => {
                if let Err(e) = sweep_expired(store, Utc::now()).await {
                    tracing::warn!(error = %e, "session sweep failed");
                }
            }
        }
    }
}
