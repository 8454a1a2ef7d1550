use screen_core::{
    format_cell, CrossingRow, FundamentalSnapshot, GrowthMetrics, SnapshotStatus, Tabular,
};
use serde::{Deserialize, Serialize};

/// Crossing row joined with its ticker's fundamentals and net score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub ticker: String,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
    pub close: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub metrics: GrowthMetrics,
    pub fundamentals: SnapshotStatus,
    pub net_score: i32,
}

impl RankedRow {
    /// Left join: a row with no snapshot keeps empty metrics and is tagged degraded.
    pub fn join(row: &CrossingRow, snapshot: Option<&FundamentalSnapshot>, net_score: i32) -> Self {
        let (sector, industry, metrics, fundamentals) = match snapshot {
            Some(s) => (s.sector.clone(), s.industry.clone(), s.metrics, s.status),
            None => (None, None, GrowthMetrics::default(), SnapshotStatus::Degraded),
        };
        Self {
            ticker: row.ticker.clone(),
            support_level: row.support_level,
            resistance_level: row.resistance_level,
            close: row.close,
            sector,
            industry,
            metrics,
            fundamentals,
            net_score,
        }
    }
}

impl Tabular for RankedRow {
    fn columns() -> Vec<&'static str> {
        vec![
            "Ticker",
            "Support",
            "Resistance",
            "Close",
            "Sector",
            "Industry",
            "Sales_QoQ_%",
            "Profit_QoQ_%",
            "EPS_QoQ_%",
            "Sales_YoY_%",
            "Profit_YoY_%",
            "EPS_YoY_%",
            "Sales_Slope_5Q",
            "Profit_Slope_5Q",
            "Fundamentals",
            "Net_Score",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let m = &self.metrics;
        vec![
            self.ticker.clone(),
            format_cell(self.support_level),
            format_cell(self.resistance_level),
            format_cell(self.close),
            self.sector.clone().unwrap_or_default(),
            self.industry.clone().unwrap_or_default(),
            format_cell(m.sales_qoq),
            format_cell(m.profit_qoq),
            format_cell(m.eps_qoq),
            format_cell(m.sales_yoy),
            format_cell(m.profit_yoy),
            format_cell(m.eps_yoy),
            format_cell(m.sales_slope),
            format_cell(m.profit_slope),
            self.fundamentals.as_str().to_string(),
            self.net_score.to_string(),
        ]
    }
}
