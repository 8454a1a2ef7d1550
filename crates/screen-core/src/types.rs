use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One technical-screen result line: a ticker that crossed one
/// support/resistance pair on the observation date.
///
/// A ticker appears once per crossing pair, so duplicates are expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingRow {
    pub ticker: String,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
    pub close: Option<f64>,
}

/// Raw technical document as stored per (ticker, date) snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalDocument {
    pub ticker: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub crossed_resistance: Vec<Crossing>,
}

/// One support/resistance crossing nested inside a technical document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Crossing {
    #[serde(default)]
    pub support_level: Option<f64>,
    #[serde(default)]
    pub resistance_level: Option<f64>,
    #[serde(default)]
    pub support_distance_pct: Option<f64>,
}

/// Filter for one technical search against a fixed observation date.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalQuery {
    pub observation_date: String,
    /// Only documents with a crossing at most this far (in %) above support.
    /// `None` selects the whole trend-template universe.
    pub max_support_distance_pct: Option<f64>,
    pub size: usize,
}

/// Fundamental document keyed by ticker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalRecord {
    #[serde(default)]
    pub sector: Option<SectorInfo>,
    #[serde(default)]
    pub quarterly: Vec<QuarterlyRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorInfo {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// One `{metric, period_date, value}` entry of the quarterly results table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterlyRecord {
    pub metric: String,
    pub period_date: String,
    /// `None` for null, missing or non-numeric cells (e.g. `"25%"` on ratio rows).
    #[serde(default, deserialize_with = "lenient_number")]
    pub value: Option<f64>,
}

/// Accept a number, a numeric string (`"1,234.5"`) or anything else as `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(v)) => Some(v),
        Some(Raw::Text(text)) => text.trim().replace(',', "").parse::<f64>().ok(),
        Some(Raw::Other(_)) | None => None,
    }
    .filter(|v| v.is_finite()))
}

/// The three quarterly metrics the score is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Sales,
    NetProfit,
    Eps,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Sales, Metric::NetProfit, Metric::Eps];

    /// Row label used by the quarterly results table.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Sales => "Sales",
            Metric::NetProfit => "Net Profit",
            Metric::Eps => "EPS in Rs",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Sales" => Some(Metric::Sales),
            "Net Profit" => Some(Metric::NetProfit),
            "EPS in Rs" => Some(Metric::Eps),
            _ => None,
        }
    }
}

/// `(period, value)` pair of one metric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyPoint {
    pub period: String,
    pub value: f64,
}

/// How much of a fundamental snapshot could be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// Lookup succeeded and every series had enough history.
    Complete,
    /// Lookup succeeded but at least one series was too short.
    Partial,
    /// Lookup failed or the payload was unusable.
    Degraded,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Complete => "complete",
            SnapshotStatus::Partial => "partial",
            SnapshotStatus::Degraded => "degraded",
        }
    }
}

/// Derived growth and trend values. `None` means undefined or unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub sales_qoq: Option<f64>,
    pub profit_qoq: Option<f64>,
    pub eps_qoq: Option<f64>,
    pub sales_yoy: Option<f64>,
    pub profit_yoy: Option<f64>,
    pub eps_yoy: Option<f64>,
    pub sales_slope: Option<f64>,
    pub profit_slope: Option<f64>,
}

/// Per-ticker fundamental view, computed fresh on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub ticker: String,
    pub status: SnapshotStatus,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub metrics: GrowthMetrics,
    /// Whether the last five quarters are consecutive. Only set on complete snapshots.
    #[serde(default)]
    pub contiguous_5q: Option<bool>,
}

impl FundamentalSnapshot {
    pub fn degraded(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            status: SnapshotStatus::Degraded,
            sector: None,
            industry: None,
            metrics: GrowthMetrics::default(),
            contiguous_5q: None,
        }
    }

    pub fn partial(ticker: impl Into<String>, sector: Option<String>, industry: Option<String>) -> Self {
        Self {
            ticker: ticker.into(),
            status: SnapshotStatus::Partial,
            sector,
            industry,
            metrics: GrowthMetrics::default(),
            contiguous_5q: None,
        }
    }
}

/// A named output table handed to an export sink.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Row types that can be laid out as a flat table.
pub trait Tabular {
    fn columns() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

impl NamedTable {
    pub fn from_rows<T: Tabular>(name: impl Into<String>, rows: &[T]) -> Self {
        Self {
            name: name.into(),
            columns: T::columns().into_iter().map(String::from).collect(),
            rows: rows.iter().map(Tabular::cells).collect(),
        }
    }
}

/// Format an optional number for a table cell; missing values become empty cells.
pub fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_labels_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_label(metric.label()), Some(metric));
        }
        assert_eq!(Metric::from_label(" Net Profit "), Some(Metric::NetProfit));
        assert_eq!(Metric::from_label("Operating Profit"), None);
    }

    #[test]
    fn test_technical_document_tolerates_missing_fields() {
        let doc: TechnicalDocument = serde_json::from_str(r#"{"ticker": "TCS.NS"}"#).unwrap();
        assert_eq!(doc.ticker, "TCS.NS");
        assert!(doc.date.is_none());
        assert!(doc.crossed_resistance.is_empty());
    }

    #[test]
    fn test_quarterly_values_decode_leniently() {
        let raw = r#"{"quarterly": [
            {"metric": "Sales", "period_date": "2025-06", "value": 1250.5},
            {"metric": "Sales", "period_date": "2025-09", "value": "1,312.0"},
            {"metric": "OPM %", "period_date": "2025-09", "value": "25%"},
            {"metric": "Net Profit", "period_date": "2025-09", "value": null},
            {"metric": "EPS in Rs", "period_date": "2025-09"},
            {"metric": "Tax %", "period_date": "2025-09", "value": {"pct": 25}}
        ]}"#;

        let record: FundamentalRecord = serde_json::from_str(raw).unwrap();

        let values: Vec<Option<f64>> = record.quarterly.iter().map(|q| q.value).collect();
        assert_eq!(values, vec![Some(1250.5), Some(1312.0), None, None, None, None]);
    }

    #[test]
    fn test_degraded_snapshot_has_no_metrics() {
        let snap = FundamentalSnapshot::degraded("INFY");
        assert_eq!(snap.status, SnapshotStatus::Degraded);
        assert_eq!(snap.metrics, GrowthMetrics::default());
        assert!(snap.sector.is_none());
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(Some(12.5)), "12.5");
        assert_eq!(format_cell(Some(-3.0)), "-3");
        assert_eq!(format_cell(None), "");
    }
}
