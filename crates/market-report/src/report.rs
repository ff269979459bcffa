//! Markdown rendering of the daily market report.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use market_core::{Quote, SectorPerformance, SentimentReading};
use market_orchestrator::{is_market_open, MarketDataService};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, WatchItem};

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// A titled table of watched symbols and whatever quotes were fetched for them.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub items: Vec<WatchItem>,
    pub quotes: HashMap<String, Quote>,
}

impl Section {
    /// Quotes in watchlist order, skipping symbols that failed to fetch.
    fn ordered_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.items.iter().filter_map(|item| self.quotes.get(&item.symbol))
    }

    /// Mean daily change across quotes that report one.
    fn average_change_pct(&self) -> Option<f64> {
        let changes: Vec<f64> = self.ordered_quotes().filter_map(|q| q.change_pct).collect();
        if changes.is_empty() {
            return None;
        }
        Some(changes.iter().sum::<f64>() / changes.len() as f64)
    }
}

#[derive(Debug, Clone)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub market_open: bool,
    pub indices: Section,
    pub sentiment: Option<SentimentReading>,
    pub vix: Option<Quote>,
    pub sections: Vec<Section>,
    pub sectors: Vec<SectorPerformance>,
}

/// Fetch everything the report needs. Missing data is left out rather than
/// failing the run.
pub async fn collect_report_data(
    service: &MarketDataService,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> ReportData {
    tracing::info!("Fetching index quotes");
    let index_symbols = symbols(&config.indices);
    let index_quotes = service.batch_get_indices(&index_symbols).await;

    let sentiment = service.get_sentiment().await.ok();
    let vix = service.get_vix().await.ok();

    tracing::info!("Fetching watchlist quotes");
    let ai_quotes = service.batch_get_stocks(&symbols(&config.ai_stocks)).await;
    let power_quotes = service.batch_get_stocks(&symbols(&config.power_stocks)).await;

    tracing::info!("Fetching sector performance");
    let sectors = service.sector_performance().await;

    ReportData {
        generated_at: now,
        market_open: is_market_open(now),
        indices: Section {
            title: "Indices".to_string(),
            items: config.indices.clone(),
            quotes: index_quotes,
        },
        sentiment,
        vix,
        sections: vec![
            Section {
                title: "AI Stocks".to_string(),
                items: config.ai_stocks.clone(),
                quotes: ai_quotes,
            },
            Section {
                title: "Power Stocks".to_string(),
                items: config.power_stocks.clone(),
                quotes: power_quotes,
            },
        ],
        sectors,
    }
}

fn symbols(items: &[WatchItem]) -> Vec<&str> {
    items.iter().map(|item| item.symbol.as_str()).collect()
}

pub fn render_report(data: &ReportData) -> String {
    let eastern = data.generated_at.with_timezone(&chrono_tz::US::Eastern);
    let status = if data.market_open { "🟢 Open" } else { "⚪ Closed" };

    let mut lines = vec![
        "# 📊 Daily Market Report".to_string(),
        String::new(),
        format!("**Date**: {}  ", eastern.format("%A, %B %d, %Y")),
        format!("**Generated**: {} ET  ", eastern.format("%H:%M:%S")),
        format!("**Market status**: {}", status),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    lines.extend(render_market_overview(data));
    for section in &data.sections {
        lines.extend(render_section(section));
    }
    lines.extend(render_sectors(&data.sectors));
    lines.extend(render_summary(data));

    lines.extend([
        "---".to_string(),
        String::new(),
        "*This report is for information only and is not investment advice.*".to_string(),
        "*Data sources: Yahoo Finance, CNN Fear & Greed Index.*".to_string(),
        format!("*Generated at {} UTC*", data.generated_at.format("%Y-%m-%d %H:%M:%S")),
    ]);

    lines.join("\n")
}

fn render_market_overview(data: &ReportData) -> Vec<String> {
    let mut lines = vec![
        "## 📈 Market Overview".to_string(),
        String::new(),
        "### Indices".to_string(),
        String::new(),
        "| Index | Last | Change | Change % |".to_string(),
        "|-------|------|--------|----------|".to_string(),
    ];

    for item in &data.indices.items {
        let name = item.name.as_deref().unwrap_or(&item.symbol);
        match data.indices.quotes.get(&item.symbol) {
            Some(quote) => lines.push(format!(
                "| {} | {} | {} | {} |",
                name,
                fmt_opt(quote.current_price, |p| fmt_thousands(p, 2)),
                fmt_change(quote.change),
                fmt_opt(quote.change_pct, fmt_pct),
            )),
            None => lines.push(format!("| {} | N/A | N/A | N/A |", name)),
        }
    }

    lines.extend([String::new(), "### Sentiment".to_string(), String::new()]);

    match &data.sentiment {
        Some(reading) => lines.push(format!(
            "- **Fear & Greed Index**: {:.1} ({})",
            reading.score,
            reading.level.to_label()
        )),
        None => lines.push("- **Fear & Greed Index**: data unavailable".to_string()),
    }

    match data.vix.as_ref().and_then(|q| q.current_price) {
        Some(vix) => lines.push(format!("- **VIX**: {:.2}", vix)),
        None => lines.push("- **VIX**: data unavailable".to_string()),
    }

    lines.extend([String::new(), "---".to_string(), String::new()]);
    lines
}

fn render_section(section: &Section) -> Vec<String> {
    let mut lines = vec![
        format!("## {}", section.title),
        String::new(),
        "| Symbol | Name | Price | Change | Technicals |".to_string(),
        "|--------|------|-------|--------|------------|".to_string(),
    ];

    for item in &section.items {
        match section.quotes.get(&item.symbol) {
            Some(quote) => {
                let name = item.name.as_deref().unwrap_or_else(|| quote.display_name());
                let change = match (quote.change, quote.change_pct) {
                    (Some(_), Some(pct)) => format!("{} ({})", fmt_change(quote.change), fmt_pct(pct)),
                    _ => "N/A".to_string(),
                };
                lines.push(format!(
                    "| {} | {} | {} | {} | {} |",
                    item.symbol,
                    name,
                    fmt_opt(quote.current_price, |p| format!("${}", fmt_thousands(p, 2))),
                    change,
                    technical_notes(quote),
                ));
            }
            None => {
                let name = item.name.as_deref().unwrap_or(&item.symbol);
                lines.push(format!("| {} | {} | N/A | N/A | data unavailable |", item.symbol, name));
            }
        }
    }

    if let Some(avg) = section.average_change_pct() {
        lines.extend([String::new(), format!("**Average change**: {}", fmt_pct(avg))]);
    }

    lines.extend([String::new(), "---".to_string(), String::new()]);
    lines
}

fn render_sectors(sectors: &[SectorPerformance]) -> Vec<String> {
    let mut lines = vec!["## 🏭 Sector Performance".to_string(), String::new()];

    if sectors.is_empty() {
        lines.push("_Sector data unavailable._".to_string());
    } else {
        let mut sorted: Vec<&SectorPerformance> = sectors.iter().collect();
        sorted.sort_by(|a, b| {
            b.change_pct
                .partial_cmp(&a.change_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        lines.push("| Sector | ETF | Change % |".to_string());
        lines.push("|--------|-----|----------|".to_string());
        for s in sorted {
            lines.push(format!("| {} | {} | {} |", s.sector, s.etf, fmt_pct(s.change_pct)));
        }
    }

    lines.extend([String::new(), "---".to_string(), String::new()]);
    lines
}

fn render_summary(data: &ReportData) -> Vec<String> {
    let mut lines = vec!["## 💡 Summary".to_string(), String::new()];

    for item in &data.indices.items {
        if let Some(pct) = data.indices.quotes.get(&item.symbol).and_then(|q| q.change_pct) {
            let name = item.name.as_deref().unwrap_or(&item.symbol);
            let direction = if pct >= 0.0 { "up" } else { "down" };
            lines.push(format!("- **{}** {} {:.2}%", name, direction, pct.abs()));
        }
    }

    for section in &data.sections {
        lines.push(section_summary(section));
    }

    if let Some(reading) = &data.sentiment {
        lines.push(format!(
            "- Market sentiment reads **{}** ({:.1})",
            reading.level.to_label(),
            reading.score
        ));
    }

    lines.push(String::new());
    lines
}

fn section_summary(section: &Section) -> String {
    let moves: Vec<(&str, f64)> = section
        .ordered_quotes()
        .filter_map(|q| q.change_pct.map(|pct| (q.symbol.as_str(), pct)))
        .collect();

    let by_change = |a: &&(&str, f64), b: &&(&str, f64)| {
        a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
    };
    let (Some(best), Some(worst), Some(avg)) = (
        moves.iter().max_by(by_change),
        moves.iter().min_by(by_change),
        section.average_change_pct(),
    ) else {
        return format!("- **{}**: data unavailable", section.title);
    };

    let advancers = moves.iter().filter(|(_, pct)| *pct > 0.0).count();
    let decliners = moves.iter().filter(|(_, pct)| *pct < 0.0).count();

    format!(
        "- **{}**: avg {}, {} up / {} down; best {} {}, worst {} {}",
        section.title,
        fmt_pct(avg),
        advancers,
        decliners,
        best.0,
        fmt_pct(best.1),
        worst.0,
        fmt_pct(worst.1)
    )
}

fn technical_notes(quote: &Quote) -> String {
    let mut notes = Vec::new();

    if let Some(rsi) = quote.rsi {
        let tag = if rsi > RSI_OVERBOUGHT {
            " overbought"
        } else if rsi < RSI_OVERSOLD {
            " oversold"
        } else {
            ""
        };
        notes.push(format!("RSI {:.1}{}", rsi, tag));
    }

    if let (Some(ma20), Some(price)) = (quote.ma20, quote.current_price) {
        let side = if price >= ma20 { "above" } else { "below" };
        notes.push(format!("{} MA20 {:.2}", side, ma20));
    }

    if let Some(ma50) = quote.ma50 {
        notes.push(format!("MA50 {:.2}", ma50));
    }

    if notes.is_empty() {
        "-".to_string()
    } else {
        notes.join(", ")
    }
}

fn fmt_opt<F: Fn(f64) -> String>(value: Option<f64>, f: F) -> String {
    value.map(f).unwrap_or_else(|| "N/A".to_string())
}

fn fmt_change(change: Option<f64>) -> String {
    match change.map(round_cents) {
        Some(c) if c > 0.0 => format!("▲ {:+.2}", c),
        Some(c) if c < 0.0 => format!("▼ {:+.2}", c),
        Some(_) => "0.00".to_string(),
        None => "N/A".to_string(),
    }
}

fn fmt_pct(pct: f64) -> String {
    format!("{:+.2}%", round_cents(pct))
}

/// Round to two decimals, folding `-0.0` into `0.0`.
fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Fixed-point formatting with comma thousands separators.
fn fmt_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let rounds_to_zero = !formatted.chars().any(|c| matches!(c, '1'..='9'));
    let sign = if value < 0.0 && !rounds_to_zero { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Default file name for a report generated at `now`.
pub fn default_report_path(output_dir: &Path, now: DateTime<Utc>) -> PathBuf {
    let eastern = now.with_timezone(&chrono_tz::US::Eastern);
    output_dir.join(format!("daily_report_{}.md", eastern.format("%Y%m%d")))
}

/// Write the report, creating parent directories as needed.
pub fn save_report(report: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    std::fs::write(path, report).with_context(|| format!("writing report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use market_core::{QuoteKind, QuoteSnapshot, SentimentReading, TechnicalSnapshot};

    fn at() -> DateTime<Utc> {
        // Wednesday 10:00 EDT
        Utc.with_ymd_and_hms(2024, 6, 5, 14, 0, 0).unwrap()
    }

    fn quote(symbol: &str, price: f64, prev: f64, rsi: Option<f64>) -> Quote {
        let kind = QuoteKind::from_symbol(symbol);
        let snapshot = QuoteSnapshot {
            regular_market_price: Some(price),
            previous_close: Some(prev),
            ..Default::default()
        };
        let technicals = TechnicalSnapshot { rsi, ma20: rsi.map(|_| prev), ma50: None };
        Quote::from_snapshot(symbol, kind, snapshot, technicals, at())
    }

    fn item(symbol: &str, name: &str) -> WatchItem {
        WatchItem { symbol: symbol.to_string(), name: Some(name.to_string()) }
    }

    fn sample_data() -> ReportData {
        let mut index_quotes = HashMap::new();
        index_quotes.insert("^GSPC".to_string(), quote("^GSPC", 5252.5, 5200.0, None));

        let mut ai_quotes = HashMap::new();
        ai_quotes.insert("NVDA".to_string(), quote("NVDA", 121.0, 110.0, Some(74.2)));
        ai_quotes.insert("TSLA".to_string(), quote("TSLA", 95.0, 100.0, Some(25.0)));

        ReportData {
            generated_at: at(),
            market_open: true,
            indices: Section {
                title: "Indices".to_string(),
                items: vec![item("^GSPC", "S&P 500"), item("^DJI", "Dow Jones")],
                quotes: index_quotes,
            },
            sentiment: Some(SentimentReading::new(62.0, at())),
            vix: Some(quote("^VIX", 14.25, 15.0, None)),
            sections: vec![
                Section {
                    title: "AI Stocks".to_string(),
                    items: vec![item("NVDA", "NVIDIA"), item("TSLA", "Tesla"), item("AMD", "AMD")],
                    quotes: ai_quotes,
                },
                Section {
                    title: "Power Stocks".to_string(),
                    items: vec![item("CEG", "Constellation Energy")],
                    quotes: HashMap::new(),
                },
            ],
            sectors: vec![
                SectorPerformance { sector: "Energy".to_string(), etf: "XLE".to_string(), change_pct: -0.5 },
                SectorPerformance { sector: "Technology".to_string(), etf: "XLK".to_string(), change_pct: 1.2 },
            ],
        }
    }

    #[test]
    fn test_render_header_and_indices() {
        let report = render_report(&sample_data());
        assert!(report.starts_with("# 📊 Daily Market Report"));
        assert!(report.contains("**Date**: Wednesday, June 05, 2024"));
        assert!(report.contains("**Generated**: 10:00:00 ET"));
        assert!(report.contains("🟢 Open"));
        assert!(report.contains("| S&P 500 | 5,252.50 | ▲ +52.50 | +1.01% |"));
        assert!(report.contains("| Dow Jones | N/A | N/A | N/A |"));
    }

    #[test]
    fn test_render_sentiment_and_vix() {
        let report = render_report(&sample_data());
        assert!(report.contains("- **Fear & Greed Index**: 62.0 (Greed)"));
        assert!(report.contains("- **VIX**: 14.25"));

        let mut data = sample_data();
        data.sentiment = None;
        data.vix = None;
        let report = render_report(&data);
        assert!(report.contains("- **Fear & Greed Index**: data unavailable"));
        assert!(report.contains("- **VIX**: data unavailable"));
    }

    #[test]
    fn test_render_watchlist_rows() {
        let report = render_report(&sample_data());
        assert!(report.contains("| NVDA | NVIDIA | $121.00 | ▲ +11.00 (+10.00%) | RSI 74.2 overbought, above MA20 110.00 |"));
        assert!(report.contains("RSI 25.0 oversold, below MA20 100.00"));
        assert!(report.contains("| AMD | AMD | N/A | N/A | data unavailable |"));
        assert!(report.contains("| CEG | Constellation Energy | N/A | N/A | data unavailable |"));
    }

    #[test]
    fn test_sectors_sorted_by_change() {
        let report = render_report(&sample_data());
        let tech = report.find("| Technology | XLK | +1.20% |").unwrap();
        let energy = report.find("| Energy | XLE | -0.50% |").unwrap();
        assert!(tech < energy);

        let mut data = sample_data();
        data.sectors.clear();
        assert!(render_report(&data).contains("_Sector data unavailable._"));
    }

    #[test]
    fn test_summary() {
        let report = render_report(&sample_data());
        assert!(report.contains("- **S&P 500** up 1.01%"));
        assert!(report.contains("- **AI Stocks**: avg +2.50%, 1 up / 1 down; best NVDA +10.00%, worst TSLA -5.00%"));
        assert!(report.contains("- **Power Stocks**: data unavailable"));
        assert!(report.contains("Market sentiment reads **Greed** (62.0)"));
    }

    #[test]
    fn test_section_average_change() {
        let report = render_report(&sample_data());
        assert!(report.contains("**Average change**: +2.50%"));
        // Power Stocks has no quotes, so only one average line is rendered
        assert_eq!(report.matches("**Average change**").count(), 1);
    }

    #[test]
    fn test_near_zero_values_render_unsigned() {
        assert_eq!(fmt_thousands(-0.001, 2), "0.00");
        assert_eq!(fmt_change(Some(-0.001)), "0.00");
        assert_eq!(fmt_change(Some(-0.006)), "▼ -0.01");
        assert_eq!(fmt_pct(-0.004), "+0.00%");
    }

    #[test]
    fn test_fmt_thousands() {
        assert_eq!(fmt_thousands(5252.5, 2), "5,252.50");
        assert_eq!(fmt_thousands(38900.0, 2), "38,900.00");
        assert_eq!(fmt_thousands(999.999, 2), "1,000.00");
        assert_eq!(fmt_thousands(14.25, 2), "14.25");
        assert_eq!(fmt_thousands(-1234567.0, 0), "-1,234,567");
    }

    #[test]
    fn test_default_report_path() {
        let path = default_report_path(Path::new("reports"), at());
        assert_eq!(path, PathBuf::from("reports/daily_report_20240605.md"));
    }

    #[test]
    fn test_save_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.md");

        save_report("# Report", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report");
    }
}
