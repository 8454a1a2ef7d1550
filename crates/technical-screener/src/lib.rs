pub mod complement;
pub mod screener;
pub mod ticker;

pub use complement::{distinct_tickers, resolve_missed};
pub use screener::{flatten_documents, ScreenFilters, ScreenResult, TechnicalScreener};
pub use ticker::normalize_ticker;
