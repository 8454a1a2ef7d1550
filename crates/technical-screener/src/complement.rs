use screen_core::CrossingRow;
use std::collections::HashSet;

/// Distinct tickers of a row set, in first-seen order.
pub fn distinct_tickers(rows: &[CrossingRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.ticker.as_str()))
        .map(|row| row.ticker.clone())
        .collect()
}

/// Universe rows whose ticker never appears in `matched`.
///
/// Identity is the normalized ticker, not the row, so every crossing row of a
/// matched ticker is excluded. Universe order is preserved.
pub fn resolve_missed(matched: &[CrossingRow], universe: &[CrossingRow]) -> Vec<CrossingRow> {
    let matched_tickers: HashSet<&str> = matched.iter().map(|row| row.ticker.as_str()).collect();
    universe
        .iter()
        .filter(|row| !matched_tickers.contains(row.ticker.as_str()))
        .cloned()
        .collect()
}
