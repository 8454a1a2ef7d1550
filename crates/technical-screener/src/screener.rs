use crate::complement::{distinct_tickers, resolve_missed};
use crate::ticker::normalize_ticker;
use screen_core::{CrossingRow, ScreenError, TechnicalDocument, TechnicalQuery, TechnicalStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScreenFilters {
    /// Upper bound on a crossing's distance above support, in percent.
    pub max_support_distance_pct: f64,
    /// Page size for both searches (the store caps it at 1000).
    pub page_size: usize,
    /// Exchange suffix stripped from tickers.
    pub exchange_suffix: String,
}

impl Default for ScreenFilters {
    fn default() -> Self {
        Self {
            max_support_distance_pct: 10.0,
            page_size: 1000,
            exchange_suffix: ".NS".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenResult {
    /// Date found on the matched documents; `None` when nothing matched.
    pub observation_date: Option<String>,
    pub matched: Vec<CrossingRow>,
    pub universe: Vec<CrossingRow>,
}

impl ScreenResult {
    pub fn empty() -> Self {
        Self {
            observation_date: None,
            matched: Vec::new(),
            universe: Vec::new(),
        }
    }

    /// Universe rows whose ticker is not in the matched set.
    pub fn missed(&self) -> Vec<CrossingRow> {
        resolve_missed(&self.matched, &self.universe)
    }
}

/// Issues the matched and full-universe searches for one observation date.
pub struct TechnicalScreener {
    store: Arc<dyn TechnicalStore>,
    index: String,
    filters: ScreenFilters,
}

impl TechnicalScreener {
    pub fn new(store: Arc<dyn TechnicalStore>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
            filters: ScreenFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: ScreenFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn filters(&self) -> &ScreenFilters {
        &self.filters
    }

    /// Run the two-query screen.
    ///
    /// The universe query reuses the date found on the matched documents, so a
    /// loosely specified input date resolves to what the store actually holds.
    /// With no matches there is no date to reuse and the universe is empty.
    pub async fn screen(&self, observation_date: &str) -> Result<ScreenResult, ScreenError> {
        let matched_query = TechnicalQuery {
            observation_date: observation_date.to_string(),
            max_support_distance_pct: Some(self.filters.max_support_distance_pct),
            size: self.filters.page_size,
        };

        tracing::info!(
            "🔎 Technical scan on {} for {} (support distance <= {}%)",
            self.index,
            observation_date,
            self.filters.max_support_distance_pct
        );
        let matched_docs = self.store.search(&self.index, &matched_query).await?;
        tracing::info!("Matched query returned {} documents", matched_docs.len());

        if matched_docs.is_empty() {
            tracing::warn!("No documents matched on {}, skipping universe query", observation_date);
            return Ok(ScreenResult::empty());
        }

        let resolved_date = resolve_observation_date(&matched_docs).unwrap_or_else(|| {
            tracing::warn!("Matched documents carry no date, using requested {}", observation_date);
            observation_date.to_string()
        });
        if resolved_date != observation_date {
            tracing::info!("Resolved observation date {} (requested {})", resolved_date, observation_date);
        }

        let matched = flatten_documents(&matched_docs, &self.filters.exchange_suffix);

        let universe_query = TechnicalQuery {
            observation_date: resolved_date.clone(),
            max_support_distance_pct: None,
            size: self.filters.page_size,
        };
        let universe_docs = self.store.search(&self.index, &universe_query).await?;
        let universe = flatten_documents(&universe_docs, &self.filters.exchange_suffix);

        tracing::info!(
            "Screen on {}: {} matched rows ({} tickers), {} universe rows ({} tickers)",
            resolved_date,
            matched.len(),
            distinct_tickers(&matched).len(),
            universe.len(),
            distinct_tickers(&universe).len()
        );

        Ok(ScreenResult {
            observation_date: Some(resolved_date),
            matched,
            universe,
        })
    }
}

/// Date carried by the last dated document in the page.
fn resolve_observation_date(docs: &[TechnicalDocument]) -> Option<String> {
    let mut dates = docs.iter().filter_map(|d| d.date.as_deref());
    let first = dates.next()?;
    let mut last = first;
    for date in dates {
        if date != last {
            tracing::warn!("Matched documents disagree on date: {} vs {}", last, date);
        }
        last = date;
    }
    Some(last.to_string())
}

/// One row per crossing of every document; documents without crossings add nothing.
pub fn flatten_documents(docs: &[TechnicalDocument], exchange_suffix: &str) -> Vec<CrossingRow> {
    docs.iter()
        .flat_map(|doc| {
            let ticker = normalize_ticker(&doc.ticker, exchange_suffix);
            doc.crossed_resistance.iter().map(move |cr| CrossingRow {
                ticker: ticker.clone(),
                support_level: cr.support_level,
                resistance_level: cr.resistance_level,
                close: doc.close,
            })
        })
        .collect()
}
