//! Static reference sheets written alongside the ranked tables.

use screen_core::NamedTable;

const WATCHED_INDICES: [&str; 27] = [
    "USDINR",
    "XAUINRG",
    "XAGINRK",
    "NASDAQ 100",
    "NIFTY 50",
    "NIFTY 500",
    "NIFTY MIDCAP 150",
    "NIFTY SMALLCAP 250",
    "NIFTY BANK",
    "NIFTY PRIVATE BANK",
    "NIFTY PSU BANK",
    "NIFTY FINANCIAL SERVICES",
    "NIFTY FMCG",
    "NIFTY IT",
    "NIFTY AUTO",
    "NIFTY METAL",
    "NIFTY PHARMA",
    "NIFTY HEALTHCARE",
    "NIFTY REALTY",
    "NIFTY MEDIA",
    "NIFTY CONSUMER DURABLES",
    "NIFTY OIL & GAS",
    "NIFTY CHEMICAL",
    "NIFTY DEFENCE",
    "NIFTY DIGITAL INDIA",
    "NIFTY EV",
    "NIfty Energy",
];

/// (index, benchmark RSI, current RSI, fund to invest)
const FUND_MAP: [(&str, f64, f64, &str); 6] = [
    ("NIFTY 50", 40.0, 53.26, "Parag Parikh Flexi Cap Fund Direct Growth"),
    ("NIFTY Mid cap 150", 39.41, 52.89, "HDFC Mid Cap Fund Direct Growth"),
    ("NIFTY Small cap 250", 38.69, 42.02, "Nippon India Small Cap Fund direct growth"),
    ("NIFTY Financial Services", 41.0, 58.19, "SBI Banking & Financial Services Fund"),
    ("NIFTY India Digital", 39.0, 39.91, "Tata Digital India Fund"),
    (
        "NIFTY India Healthcare",
        37.27,
        43.73,
        "ICICI Prudential Pharma Healthcare & Diagnostics Fund",
    ),
];

/// Index watch sheet with an empty status column to be filled by hand.
pub fn indices_table() -> NamedTable {
    NamedTable {
        name: "indices".to_string(),
        columns: vec!["Index Name".to_string(), "STATUS".to_string()],
        rows: WATCHED_INDICES
            .iter()
            .map(|name| vec![name.to_string(), String::new()])
            .collect(),
    }
}

/// Mutual fund mapping sheet keyed by benchmark index.
pub fn mutual_fund_table() -> NamedTable {
    NamedTable {
        name: "MF".to_string(),
        columns: ["Indices", "Benchmark RSI", "Current RSI", "Mutual fund to invest"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        rows: FUND_MAP
            .iter()
            .map(|(index, benchmark, current, fund)| {
                vec![index.to_string(), benchmark.to_string(), current.to_string(), fund.to_string()]
            })
            .collect(),
    }
}

pub fn reference_tables() -> Vec<NamedTable> {
    vec![indices_table(), mutual_fund_table()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_tables_shape() {
        let tables = reference_tables();
        assert_eq!(tables.len(), 2);
        for table in &tables {
            assert!(table.rows.iter().all(|r| r.len() == table.columns.len()));
        }
        assert_eq!(tables[0].name, "indices");
        assert_eq!(tables[0].rows.len(), 27);
        assert_eq!(tables[0].rows[26], vec!["NIfty Energy".to_string(), String::new()]);
        assert_eq!(tables[1].name, "MF");
        assert_eq!(tables[1].rows[0][1], "40");
    }
}
