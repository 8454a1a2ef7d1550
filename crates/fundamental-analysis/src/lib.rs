use screen_core::{FundamentalRecord, FundamentalSnapshot, FundamentalStore, ScreenError, SnapshotStatus};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub mod series;

pub use series::{is_continuous_quarters, snapshot_from_record, MetricSeries};

/// Max concurrent fundamental lookups
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Fetches fundamental records by ticker and derives growth/trend snapshots.
///
/// A failed lookup never fails the batch: the ticker gets a degraded snapshot.
#[derive(Clone)]
pub struct FundamentalEnricher {
    store: Arc<dyn FundamentalStore>,
    index: String,
    concurrency: usize,
}

impl FundamentalEnricher {
    pub fn new(store: Arc<dyn FundamentalStore>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Snapshot for a single ticker.
    pub async fn snapshot(&self, ticker: &str) -> FundamentalSnapshot {
        let fetched = self.store.fetch(&self.index, ticker).await;
        derive_snapshot(ticker, fetched)
    }

    /// One snapshot per distinct ticker, in first-seen input order.
    pub async fn enrich(&self, tickers: &[String]) -> Vec<FundamentalSnapshot> {
        let mut seen = HashSet::new();
        let distinct: Vec<String> = tickers
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect();

        tracing::info!("📊 Enriching {} tickers from {}", distinct.len(), self.index);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (idx, ticker) in distinct.iter().cloned().enumerate() {
            let enricher = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let snapshot = enricher.snapshot(&ticker).await;
                (idx, snapshot)
            });
        }

        let mut slots: Vec<Option<FundamentalSnapshot>> = vec![None; distinct.len()];
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok((idx, snapshot)) => slots[idx] = Some(snapshot),
                Err(e) => tracing::error!("Enrichment task error: {}", e),
            }
        }

        let snapshots: Vec<FundamentalSnapshot> = slots
            .into_iter()
            .zip(distinct)
            .map(|(slot, ticker)| slot.unwrap_or_else(|| FundamentalSnapshot::degraded(ticker)))
            .collect();

        let complete = snapshots
            .iter()
            .filter(|s| s.status == SnapshotStatus::Complete)
            .count();
        tracing::info!(
            "Enrichment done: {}/{} tickers with complete fundamentals",
            complete,
            snapshots.len()
        );

        snapshots
    }
}

/// Turn a lookup outcome into a snapshot, degrading on any error.
pub fn derive_snapshot(ticker: &str, fetched: Result<FundamentalRecord, ScreenError>) -> FundamentalSnapshot {
    match fetched {
        Ok(record) => snapshot_from_record(ticker, &record),
        Err(e) => {
            tracing::warn!("Fundamentals unavailable for {}: {}", ticker, e);
            FundamentalSnapshot::degraded(ticker)
        }
    }
}
