pub mod config;
pub mod export;
pub mod pipeline;
pub mod reference;

pub use config::ScreenConfig;
pub use export::CsvDirectorySink;
pub use pipeline::{ScreenPipeline, ScreenReport};
