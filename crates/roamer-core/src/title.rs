//! Plan titles from an external text generator, with a bounded wait.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::category::CategoryRegistry;
use crate::place::Place;

pub const MAX_TITLE_CHARS: usize = 30;
pub const DEFAULT_TITLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Produces candidate titles for a prompt.
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Vec<String>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn TitleGenerator) {}
};

/// Describe the stops of a plan for the title generator.
pub fn build_prompt(places: &[Place], registry: &CategoryRegistry) -> String {
    let stops: Vec<String> = places
        .iter()
        .map(|p| match p.main_category(registry) {
            Some(category) => format!("{} ({})", p.name, category.display_name),
            None => p.name.clone(),
        })
        .collect();
    format!(
        "Suggest short titles (at most {MAX_TITLE_CHARS} characters) for a walking plan visiting: {}",
        stops.join(", ")
    )
}

/// Longest usable candidate, or `fallback` when none fits.
///
/// Candidates are trimmed and stripped of surrounding quotes; length is
/// counted in characters.
pub fn choose_title(candidates: &[String], fallback: &str) -> String {
    candidates
        .iter()
        .map(|c| c.trim().trim_matches(|ch: char| matches!(ch, '"' | '\'' | '「' | '」' | '“' | '”')).trim())
        .filter(|c| !c.is_empty() && c.chars().count() <= MAX_TITLE_CHARS)
        .max_by_key(|c| c.chars().count())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// Ask `generator` for a title, falling back to `fallback` on error,
/// timeout, or when no candidate fits.
pub async fn generate_title(
    generator: &dyn TitleGenerator,
    prompt: &str,
    fallback: &str,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, generator.complete(prompt)).await {
        Ok(Ok(candidates)) => choose_title(&candidates, fallback),
        Ok(Err(e)) => {
            warn!(error = %e, "title generation failed");
            fallback.to_string()
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "title generation timed out");
            fallback.to_string()
        }
    }
}
