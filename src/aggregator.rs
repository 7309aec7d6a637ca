use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::fetcher::{FeedError, Fetcher};
use crate::normalize::{normalize, Item};
use crate::parser::parse_feed;
use crate::registry::{Registry, Source};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Source not found: {0}")]
    SourceNotFound(String),
}

/// Combined listing across every source, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct FeedsResponse {
    pub success: bool,
    pub count: usize,
    pub entries: Vec<Item>,
}

impl FeedsResponse {
    fn new(entries: Vec<Item>) -> Self {
        Self {
            success: true,
            count: entries.len(),
            entries,
        }
    }
}

/// Listing for a single source, in feed order.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFeedResponse {
    pub success: bool,
    pub source: String,
    pub count: usize,
    pub entries: Vec<Item>,
}

impl SourceFeedResponse {
    fn new(source: String, entries: Vec<Item>) -> Self {
        Self {
            success: true,
            source,
            count: entries.len(),
            entries,
        }
    }
}

pub struct Aggregator {
    registry: Registry,
    fetcher: Fetcher,
}

impl Aggregator {
    pub fn new(registry: Registry, fetcher: Fetcher) -> Self {
        Self { registry, fetcher }
    }

    /// Loads every source concurrently and merges the results, newest first.
    ///
    /// Sources that fail to load are logged and contribute no items.
    pub async fn aggregate_all(&self) -> FeedsResponse {
        let now = Utc::now();
        let sources = self.registry.sources();

        let outcomes = join_all(
            sources
                .iter()
                .map(|source| self.collect_source(source, now)),
        )
        .await;

        let mut entries = Vec::new();
        for (source, outcome) in sources.iter().zip(outcomes) {
            entries.extend(contain_failure(source, outcome));
        }

        sort_by_recency(&mut entries);

        info!(
            "Aggregated {} items from {} sources",
            entries.len(),
            sources.len()
        );
        FeedsResponse::new(entries)
    }

    /// Loads one source by name, keeping feed order.
    ///
    /// Fails only when `source_name` isn't registered; a source that can't be
    /// loaded yields an empty listing.
    pub async fn aggregate_one(
        &self,
        source_name: &str,
    ) -> Result<SourceFeedResponse, AggregateError> {
        let source = self
            .registry
            .get(source_name)
            .ok_or_else(|| AggregateError::SourceNotFound(source_name.to_string()))?;

        let outcome = self.collect_source(source, Utc::now()).await;
        let entries = contain_failure(source, outcome);

        Ok(SourceFeedResponse::new(source.name.clone(), entries))
    }

    async fn collect_source(
        &self,
        source: &Source,
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, FeedError> {
        info!("Fetching feed: {} ({})", source.name, source.url);

        let bytes = self.fetcher.fetch(&source.url).await?;
        let raw_items = parse_feed(&bytes)?;

        Ok(raw_items
            .into_iter()
            .map(|raw| normalize(source, raw, now))
            .collect())
    }
}

fn contain_failure(source: &Source, outcome: Result<Vec<Item>, FeedError>) -> Vec<Item> {
    match outcome {
        Ok(items) => items,
        Err(e) => {
            warn!(source = %source.name, error = %e, "Feed unavailable, skipping");
            Vec::new()
        }
    }
}

/// Stable sort, newest first. Undated items (timestamp 0) end up last in
/// their original order.
fn sort_by_recency(items: &mut [Item]) {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
