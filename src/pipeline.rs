use chrono::Utc;
use thiserror::Error;

use crate::db::DbError;
use crate::llm::extract::search_hackathons;
use crate::llm::ProviderError;
use crate::models::ScrapeSummary;
use crate::normalize::{extract_json_array, normalize_batch};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to store hackathons: {0}")]
    Persistence(#[from] DbError),

    #[error("no hackathons found")]
    NoResults,
}

/// Counts from one successful search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub query: String,
    pub created: usize,
    pub updated: usize,
    pub dropped: usize,
    pub truncated: usize,
}

impl ScrapeOutcome {
    pub fn stored(&self) -> usize {
        self.created + self.updated
    }
}

/// Run one search end to end: provider call → normalize → upsert.
///
/// A provider failure or an empty batch leaves the store untouched. A
/// persistence failure may leave part of the batch written.
pub async fn run_scrape(
    state: &AppState,
    query: Option<&str>,
) -> Result<ScrapeOutcome, ScrapeError> {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(state.config.default_query.as_str())
        .to_string();

    let result = scrape(state, &query).await;

    let summary = match &result {
        Ok(outcome) => ScrapeSummary {
            query: query.clone(),
            finished_at: Utc::now(),
            created: outcome.created,
            updated: outcome.updated,
            dropped: outcome.dropped,
            error: None,
        },
        Err(e) => ScrapeSummary {
            query: query.clone(),
            finished_at: Utc::now(),
            created: 0,
            updated: 0,
            dropped: 0,
            error: Some(e.to_string()),
        },
    };
    state.record_scrape(summary);

    result
}

async fn scrape(state: &AppState, query: &str) -> Result<ScrapeOutcome, ScrapeError> {
    let limit = state.config.result_limit;
    let llm_config = &state.config.llm;

    let raw = search_hackathons(&state.http_client, llm_config, query, limit)
        .await
        .inspect_err(|e| tracing::error!("Provider call failed: {e}"))?;

    let candidates = extract_json_array(&raw).inspect_err(|e| {
        tracing::error!("Could not parse provider reply: {e}");
    })?;
    let batch = normalize_batch(candidates, Utc::now(), limit);

    tracing::info!(
        "Normalized {} hackathons for {query:?} ({} dropped, {} over limit)",
        batch.records.len(),
        batch.dropped.len(),
        batch.truncated
    );

    if batch.records.is_empty() {
        tracing::warn!("No usable hackathons in provider reply");
        return Err(ScrapeError::NoResults);
    }

    let stored = state.store.upsert_batch(&batch.records).await?;

    Ok(ScrapeOutcome {
        query: query.to_string(),
        created: stored.created,
        updated: stored.updated,
        dropped: batch.dropped.len(),
        truncated: batch.truncated,
    })
}
