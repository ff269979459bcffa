use market_core::{Quote, SectorPerformance};
use std::collections::HashMap;

/// SPDR sector ETFs used as proxies for sector performance.
pub const SECTOR_ETFS: &[(&str, &str)] = &[
    ("Technology", "XLK"),
    ("Financial", "XLF"),
    ("Healthcare", "XLV"),
    ("Energy", "XLE"),
    ("Utilities", "XLU"),
    ("Consumer Discretionary", "XLY"),
    ("Consumer Staples", "XLP"),
    ("Industrials", "XLI"),
    ("Materials", "XLB"),
    ("Real Estate", "XLRE"),
    ("Communication", "XLC"),
];

pub fn sector_symbols() -> Vec<&'static str> {
    SECTOR_ETFS.iter().map(|(_, etf)| *etf).collect()
}

/// Sector moves in table order, skipping ETFs without a daily change.
pub fn sector_performance_from(quotes: &HashMap<String, Quote>) -> Vec<SectorPerformance> {
    SECTOR_ETFS
        .iter()
        .filter_map(|(sector, etf)| {
            let change_pct = quotes.get(*etf)?.change_pct?;
            Some(SectorPerformance {
                sector: sector.to_string(),
                etf: etf.to_string(),
                change_pct,
            })
        })
        .collect()
}
