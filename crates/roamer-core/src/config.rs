//! Tunables of the plan generator.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! anchor_count = 2
//! claim_strategy = "parallel"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::anchor::{DEFAULT_ANCHOR_COUNT, DEFAULT_MIN_SEPARATION_METERS};
use crate::enrich::DEFAULT_ENRICHMENT_CONCURRENCY;
use crate::geo::WALKING_SPEED_METERS_PER_MINUTE;
use crate::itinerary::{ClaimStrategy, ItineraryConfig};
use crate::session::DEFAULT_SESSION_TTL_DAYS;

/// A tunable outside the range the generator can work with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a finite, non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub anchor_count: usize,
    /// Stops per plan, anchor included.
    pub max_places: usize,
    pub local_radius_meters: f64,
    pub anchor_separation_meters: f64,
    /// Radius of the nearby search around the start location.
    pub search_radius_meters: f64,
    pub default_free_time_minutes: u32,
    pub walking_speed_meters_per_minute: f64,
    pub min_rating: f64,
    pub min_rating_count: u32,
    pub title_timeout_ms: u64,
    pub session_ttl_days: i64,
    /// Seconds between expired-session sweeps.
    pub sweep_interval_secs: u64,
    pub enrichment_concurrency: usize,
    pub claim_strategy: ClaimStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            anchor_count: DEFAULT_ANCHOR_COUNT,
            max_places: 4,
            local_radius_meters: 500.0,
            anchor_separation_meters: DEFAULT_MIN_SEPARATION_METERS,
            search_radius_meters: 2000.0,
            default_free_time_minutes: 180,
            walking_speed_meters_per_minute: WALKING_SPEED_METERS_PER_MINUTE,
            min_rating: 0.0,
            min_rating_count: 0,
            title_timeout_ms: 2000,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            sweep_interval_secs: 3600,
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
            claim_strategy: ClaimStrategy::default(),
        }
    }
}

impl PlannerConfig {
    pub fn itinerary_config(&self) -> ItineraryConfig {
        ItineraryConfig {
            max_places: self.max_places,
            local_radius_meters: self.local_radius_meters,
            default_free_time_minutes: self.default_free_time_minutes,
            walking_speed_meters_per_minute: self.walking_speed_meters_per_minute,
        }
    }

    pub fn title_timeout(&self) -> Duration {
        Duration::from_millis(self.title_timeout_ms)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Reject values that would make generation meaningless, such as a
    /// walking speed of zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("walking_speed_meters_per_minute", self.walking_speed_meters_per_minute),
            ("search_radius_meters", self.search_radius_meters),
            ("local_radius_meters", self.local_radius_meters),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("anchor_separation_meters", self.anchor_separation_meters),
            ("min_rating", self.min_rating),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let counts = [
            ("anchor_count", self.anchor_count as u64),
            ("max_places", self.max_places as u64),
            ("enrichment_concurrency", self.enrichment_concurrency as u64),
            ("sweep_interval_secs", self.sweep_interval_secs),
        ];
        if let Some((field, _)) = counts.into_iter().find(|(_, n)| *n == 0) {
            return Err(ConfigError::Zero { field });
        }
        if self.session_ttl_days < 1 {
            return Err(ConfigError::Zero {
                field: "session_ttl_days",
            });
        }
        Ok(())
    }
}
