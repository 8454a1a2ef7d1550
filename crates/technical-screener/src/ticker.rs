/// Normalize a raw ticker for identity comparisons and fundamental lookups:
/// trimmed, upper-cased, and with the exchange suffix removed.
pub fn normalize_ticker(raw: &str, exchange_suffix: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let suffix = exchange_suffix.trim().to_uppercase();
    if suffix.is_empty() {
        return upper;
    }
    match upper.strip_suffix(suffix.as_str()) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_exchange_suffix() {
        assert_eq!(normalize_ticker("RELIANCE.NS", ".NS"), "RELIANCE");
        assert_eq!(normalize_ticker("  tcs.ns ", ".NS"), "TCS");
        assert_eq!(normalize_ticker("M&M.NS", ".ns"), "M&M");
    }

    #[test]
    fn test_keeps_ticker_without_suffix() {
        assert_eq!(normalize_ticker("INFY", ".NS"), "INFY");
        assert_eq!(normalize_ticker("HDFCBANK.BO", ".NS"), "HDFCBANK.BO");
        assert_eq!(normalize_ticker("wipro", ""), "WIPRO");
    }

    #[test]
    fn test_suffix_only_is_not_emptied() {
        assert_eq!(normalize_ticker(".NS", ".NS"), ".NS");
    }
}
