//! Net Score
//!
//! Weighted sign scoring of fundamental growth and trend signals, joined onto
//! technical crossing rows and ranked best-first.

pub mod models;
pub mod ranker;

pub use models::RankedRow;
pub use ranker::{NetScoreRanker, ScoreWeights};
