//! Search request bodies for the technical index.

use screen_core::TechnicalQuery;
use serde_json::{json, Value};

/// Largest page the store returns for a single search.
pub const MAX_PAGE_SIZE: usize = 1000;

pub const TREND_TEMPLATE_FIELD: &str = "vcp_trend_template";
pub const SUPPORT_DISTANCE_FIELD: &str = "crossed_resistance.support_distance_pct";

/// Build the bool query body for a technical search.
///
/// Every clause is a `must`: the trend-template flag and the observation date
/// always apply, the support-distance range only when the query carries one.
pub fn search_body(query: &TechnicalQuery) -> Value {
    let mut must = Vec::with_capacity(3);
    if let Some(max_pct) = query.max_support_distance_pct {
        must.push(json!({ "range": { SUPPORT_DISTANCE_FIELD: { "lte": max_pct } } }));
    }
    must.push(json!({ "term": { TREND_TEMPLATE_FIELD: true } }));
    must.push(json!({ "term": { "date": query.observation_date } }));

    json!({
        "track_total_hits": true,
        "size": query.size.clamp(1, MAX_PAGE_SIZE),
        "_source": ["ticker", "crossed_resistance", "close", "date"],
        "query": { "bool": { "must": must } }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(max_pct: Option<f64>, size: usize) -> TechnicalQuery {
        TechnicalQuery {
            observation_date: "2026-02-09".to_string(),
            max_support_distance_pct: max_pct,
            size,
        }
    }

    #[test]
    fn test_matched_query_has_distance_range() {
        let body = search_body(&query(Some(10.0), 1000));
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 3);
        assert_eq!(must[0]["range"][SUPPORT_DISTANCE_FIELD]["lte"], json!(10.0));
        assert_eq!(must[1]["term"][TREND_TEMPLATE_FIELD], json!(true));
        assert_eq!(must[2]["term"]["date"], json!("2026-02-09"));
        assert_eq!(body["track_total_hits"], json!(true));
    }

    #[test]
    fn test_universe_query_has_no_distance_range() {
        let body = search_body(&query(None, 1000));
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert!(must.iter().all(|clause| clause.get("range").is_none()));
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(search_body(&query(None, 5000))["size"], json!(MAX_PAGE_SIZE));
        assert_eq!(search_body(&query(None, 0))["size"], json!(1));
        assert_eq!(search_body(&query(None, 250))["size"], json!(250));
    }
}
