use crate::config::ScreenConfig;
use crate::reference::reference_tables;
use fundamental_analysis::FundamentalEnricher;
use net_score::{NetScoreRanker, RankedRow};
use screen_core::{ExportSink, FundamentalStore, NamedTable, ScreenError, TechnicalStore};
use search_client::{SearchClient, SearchClientConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use technical_screener::{distinct_tickers, ScreenFilters, TechnicalScreener};

/// Ranked output of one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReport {
    /// Date the store resolved for the run; `None` when nothing matched.
    pub observation_date: Option<String>,
    pub matched: Vec<RankedRow>,
    pub missed: Vec<RankedRow>,
}

fn count_distinct(rows: &[RankedRow]) -> usize {
    rows.iter().map(|r| r.ticker.as_str()).collect::<HashSet<_>>().len()
}

impl ScreenReport {
    pub fn matched_tickers(&self) -> usize {
        count_distinct(&self.matched)
    }

    pub fn missed_tickers(&self) -> usize {
        count_distinct(&self.missed)
    }

    /// Tables in sheet order: reference sheets (if asked for), then matched, then missed.
    pub fn tables(&self, include_reference: bool) -> Vec<NamedTable> {
        let mut tables = if include_reference {
            reference_tables()
        } else {
            Vec::new()
        };
        tables.push(NamedTable::from_rows("matched", &self.matched));
        tables.push(NamedTable::from_rows("missed", &self.missed));
        tables
    }

    pub fn export(&self, sink: &mut dyn ExportSink, include_reference: bool) -> Result<(), ScreenError> {
        sink.write_tables(&self.tables(include_reference))
    }
}

/// Screen, enrich, score: the whole run behind one call.
pub struct ScreenPipeline {
    config: ScreenConfig,
    screener: TechnicalScreener,
    enricher: FundamentalEnricher,
    ranker: NetScoreRanker,
}

impl ScreenPipeline {
    pub fn new(
        config: ScreenConfig,
        technical: Arc<dyn TechnicalStore>,
        fundamental: Arc<dyn FundamentalStore>,
    ) -> Self {
        let screener = TechnicalScreener::new(technical, config.technical_index.clone()).with_filters(
            ScreenFilters {
                max_support_distance_pct: config.max_support_distance_pct,
                page_size: config.effective_page_size(),
                exchange_suffix: config.exchange_suffix.clone(),
            },
        );
        let enricher = FundamentalEnricher::new(fundamental, config.fundamental_index.clone())
            .with_concurrency(config.effective_concurrency());

        Self {
            config,
            screener,
            enricher,
            ranker: NetScoreRanker::new(),
        }
    }

    /// Pipeline backed by a single store client for both indices.
    pub fn from_config(config: ScreenConfig) -> Self {
        let client = Arc::new(SearchClient::new(SearchClientConfig {
            api_key: config.api_key.clone(),
            timeout: config.request_timeout(),
            rate_limit_per_minute: config.rate_limit_per_minute,
            ..SearchClientConfig::new(config.store_endpoint.clone())
        }));
        tracing::debug!("Store client for {}", client.endpoint());
        Self::new(config, client.clone(), client)
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Run the screen for the configured observation date.
    ///
    /// Only the technical searches can fail the run; fundamental lookups
    /// degrade per ticker.
    pub async fn run(&self) -> Result<ScreenReport, ScreenError> {
        let requested = self.config.observation_date.trim();
        if requested.is_empty() {
            return Err(ScreenError::Config("observation date is required".to_string()));
        }

        let screen = self.screener.screen(requested).await?;
        let missed_rows = screen.missed();

        let matched_tickers = distinct_tickers(&screen.matched);
        let missed_tickers = distinct_tickers(&missed_rows);
        tracing::info!(
            "📈 {} distinct matched tickers, {} distinct missed tickers",
            matched_tickers.len(),
            missed_tickers.len()
        );

        let matched_snapshots = self.enricher.enrich(&matched_tickers).await;
        let missed_snapshots = self.enricher.enrich(&missed_tickers).await;

        let matched = self.ranker.rank(&screen.matched, &matched_snapshots);
        let missed = self.ranker.rank(&missed_rows, &missed_snapshots);

        tracing::info!(
            "✅ Screen complete for {}: {} matched rows, {} missed rows",
            screen.observation_date.as_deref().unwrap_or(requested),
            matched.len(),
            missed.len()
        );

        Ok(ScreenReport {
            observation_date: screen.observation_date,
            matched,
            missed,
        })
    }
}
