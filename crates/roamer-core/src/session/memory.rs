//! A process-local session store.

use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlanCandidateSession, SessionMeta, SessionStore, StoreError};
use crate::place::Place;
use crate::plan::Plan;

/// Keeps sessions in a map behind a tokio `RwLock`.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, PlanCandidateSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully built session, replacing any with the same id.
    pub async fn insert(&self, session: PlanCandidateSession) {
        self.sessions.write().await.insert(session.id, session);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, id: Uuid, meta: SessionMeta, ttl: Duration) -> Result<PlanCandidateSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(anyhow!("plan candidate session {id} already exists").into());
        }
        let now = Utc::now();
        let session = PlanCandidateSession {
            id,
            meta,
            plans: Vec::new(),
            search_results: Vec::new(),
            created_at: now,
            expires_at: now + ttl,
        };
        sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn find(&self, id: Uuid, now: DateTime<Utc>) -> Result<PlanCandidateSession, StoreError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or(StoreError::NotFound(id))?;
        if session.is_expired_at(now) {
            return Err(StoreError::Expired {
                id,
                expired_at: session.expires_at,
            });
        }
        Ok(session.clone())
    }

    async fn add_plans(&self, id: Uuid, plans: &[Plan]) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        session.plans.extend_from_slice(plans);
        Ok(())
    }

    async fn add_search_results(&self, id: Uuid, places: &[Place]) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        for place in places {
            if !session
                .search_results
                .iter()
                .any(|cached| cached.provider_id == place.provider_id)
            {
                session.search_results.push(place.clone());
            }
        }
        Ok(())
    }

    async fn update_search_results(&self, id: Uuid, places: &[Place]) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let mut replaced = 0;
        for place in places {
            if let Some(cached) = session
                .search_results
                .iter_mut()
                .find(|cached| cached.provider_id == place.provider_id)
            {
                *cached = place.clone();
                replaced += 1;
            }
        }
        Ok(replaced)
    }

    async fn find_expired_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut expired: Vec<(DateTime<Utc>, Uuid)> = sessions
            .values()
            .filter(|s| s.expires_at <= cutoff)
            .map(|s| (s.expires_at, s.id))
            .collect();
        expired.sort();
        Ok(expired.into_iter().map(|(_, id)| id).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // Plans and cached results live inside the session value.
        Ok(self.sessions.write().await.remove(&id).is_some())
    }
}
