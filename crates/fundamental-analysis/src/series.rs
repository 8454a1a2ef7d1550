//! Quarterly series extraction and snapshot derivation.

use chrono::{Datelike, NaiveDate};
use screen_core::{
    growth, trend_slope, FundamentalRecord, FundamentalSnapshot, GrowthMetrics, Metric,
    QuarterlyPoint, SnapshotStatus, TREND_WINDOW,
};
use std::collections::BTreeMap;

/// Series of the three scored metrics, each ascending by period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    pub sales: Vec<QuarterlyPoint>,
    pub profit: Vec<QuarterlyPoint>,
    pub eps: Vec<QuarterlyPoint>,
}

impl MetricSeries {
    /// Partition quarterly records by metric. Unknown metrics and points without
    /// a numeric value are ignored; a repeated period keeps the last value seen.
    pub fn from_record(record: &FundamentalRecord) -> Self {
        let mut by_metric: BTreeMap<(u8, String), f64> = BTreeMap::new();
        for q in &record.quarterly {
            let (Some(metric), Some(value)) = (Metric::from_label(&q.metric), q.value) else {
                continue;
            };
            by_metric.insert((metric_key(metric), q.period_date.trim().to_string()), value);
        }

        let mut series = MetricSeries::default();
        for ((key, period), value) in by_metric {
            let point = QuarterlyPoint { period, value };
            match key {
                0 => series.sales.push(point),
                1 => series.profit.push(point),
                _ => series.eps.push(point),
            }
        }
        series
    }

    pub fn get(&self, metric: Metric) -> &[QuarterlyPoint] {
        match metric {
            Metric::Sales => &self.sales,
            Metric::NetProfit => &self.profit,
            Metric::Eps => &self.eps,
        }
    }

    /// Length of the shortest series.
    pub fn min_len(&self) -> usize {
        Metric::ALL.iter().map(|m| self.get(*m).len()).min().unwrap_or(0)
    }
}

fn metric_key(metric: Metric) -> u8 {
    match metric {
        Metric::Sales => 0,
        Metric::NetProfit => 1,
        Metric::Eps => 2,
    }
}

/// Values of the last [`TREND_WINDOW`] points.
fn window(points: &[QuarterlyPoint]) -> Vec<f64> {
    let start = points.len().saturating_sub(TREND_WINDOW);
    points[start..].iter().map(|p| p.value).collect()
}

/// QoQ = last vs second-last, YoY = last vs first of the window.
fn qoq_yoy(values: &[f64]) -> (Option<f64>, Option<f64>) {
    match values {
        [first, .., prev, last] => (growth(*last, Some(*prev)), growth(*last, Some(*first))),
        _ => (None, None),
    }
}

fn parse_period(period: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", period.trim()), "%Y-%m-%d").ok()
}

/// Whether consecutive `YYYY-MM` periods are exactly one quarter apart.
/// `None` when any period does not parse.
pub fn is_continuous_quarters(periods: &[&str]) -> Option<bool> {
    let dates: Vec<NaiveDate> = periods.iter().map(|p| parse_period(p)).collect::<Option<_>>()?;
    Some(dates.windows(2).all(|pair| {
        let months = (pair[1].year() - pair[0].year()) * 12 + pair[1].month() as i32 - pair[0].month() as i32;
        months == 3
    }))
}

/// Derive the snapshot for one successfully fetched record.
pub fn snapshot_from_record(ticker: &str, record: &FundamentalRecord) -> FundamentalSnapshot {
    let sector = record.sector.as_ref().and_then(|s| s.sector.clone());
    let industry = record.sector.as_ref().and_then(|s| s.industry.clone());

    let series = MetricSeries::from_record(record);
    if series.min_len() < TREND_WINDOW {
        tracing::debug!(
            "{}: short quarterly history (sales={}, profit={}, eps={})",
            ticker,
            series.sales.len(),
            series.profit.len(),
            series.eps.len()
        );
        return FundamentalSnapshot::partial(ticker, sector, industry);
    }

    let sales = window(&series.sales);
    let profit = window(&series.profit);
    let eps = window(&series.eps);

    let (sales_qoq, sales_yoy) = qoq_yoy(&sales);
    let (profit_qoq, profit_yoy) = qoq_yoy(&profit);
    let (eps_qoq, eps_yoy) = qoq_yoy(&eps);

    let contiguous = Metric::ALL.iter().try_fold(true, |acc, metric| {
        let points = series.get(*metric);
        let tail = &points[points.len() - TREND_WINDOW..];
        let periods: Vec<&str> = tail.iter().map(|p| p.period.as_str()).collect();
        is_continuous_quarters(&periods).map(|ok| acc && ok)
    });
    if contiguous == Some(false) {
        tracing::debug!("{}: last {} quarters are not consecutive", ticker, TREND_WINDOW);
    }

    FundamentalSnapshot {
        ticker: ticker.to_string(),
        status: SnapshotStatus::Complete,
        sector,
        industry,
        metrics: GrowthMetrics {
            sales_qoq,
            profit_qoq,
            eps_qoq,
            sales_yoy,
            profit_yoy,
            eps_yoy,
            sales_slope: trend_slope(&sales),
            profit_slope: trend_slope(&profit),
        },
        contiguous_5q: contiguous,
    }
}
