//! PostgreSQL persistence for plan candidate sessions.
//!
//! Row models and query functions only; domain types live in `roamer-core`,
//! which serializes places and plans into the JSONB columns here.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
