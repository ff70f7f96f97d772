//! Query functions, one module per table.

pub mod plans;
pub mod search_results;
pub mod sessions;
