use async_trait::async_trait;
use crate::{FundamentalRecord, NamedTable, ScreenError, TechnicalDocument, TechnicalQuery};

/// Searchable time-series store holding one document per (ticker, date)
#[async_trait]
pub trait TechnicalStore: Send + Sync {
    /// Run a filtered search and return the first page of matching documents.
    async fn search(&self, index: &str, query: &TechnicalQuery) -> Result<Vec<TechnicalDocument>, ScreenError>;
}

/// Keyed document store holding one fundamental record per ticker
#[async_trait]
pub trait FundamentalStore: Send + Sync {
    async fn fetch(&self, index: &str, ticker: &str) -> Result<FundamentalRecord, ScreenError>;
}

/// Output target for the ranked tables
pub trait ExportSink {
    fn write_tables(&mut self, tables: &[NamedTable]) -> Result<(), ScreenError>;
}
