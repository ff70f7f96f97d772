//! Plan generation engine.
//!
//! Turns a pool of nearby places into a handful of walkable, time-boxed
//! plans: filtering, anchor selection, greedy itinerary building, provider
//! enrichment, and session storage of the results.

pub mod anchor;
pub mod category;
pub mod concurrency;
pub mod config;
pub mod enrich;
pub mod filter;
pub mod generate;
pub mod geo;
pub mod itinerary;
pub mod place;
pub mod plan;
pub mod provider;
pub mod session;
pub mod title;
