pub mod error;
pub mod growth;
pub mod traits;
pub mod types;

pub use error::*;
pub use growth::{growth, round2, trend_slope, TREND_WINDOW};
pub use traits::*;
pub use types::*;
