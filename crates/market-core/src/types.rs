use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a quote belongs to a tradable equity/ETF or to a market index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteKind {
    Equity,
    Index,
}

impl QuoteKind {
    /// Index symbols use the `^` prefix convention (`^GSPC`, `^VIX`).
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol.starts_with('^') {
            QuoteKind::Index
        } else {
            QuoteKind::Equity
        }
    }

    /// Prefix used for cache keys of this kind.
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            QuoteKind::Equity => "stock",
            QuoteKind::Index => "index",
        }
    }
}

/// Single closing price from a daily history series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: DateTime<Utc>,
    pub close: f64,
}

/// Raw point-in-time fields as reported by a market-data provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub name: Option<String>,
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<f64>,
    pub average_volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

impl QuoteSnapshot {
    /// Best available price for the given kind.
    ///
    /// Equities prefer the live trade price, indices start at the regular
    /// market price. Both fall back to the previous close.
    pub fn effective_price(&self, kind: QuoteKind) -> Option<f64> {
        match kind {
            QuoteKind::Equity => self
                .current_price
                .or(self.regular_market_price)
                .or(self.previous_close),
            QuoteKind::Index => self.regular_market_price.or(self.previous_close),
        }
    }
}

/// Indicator values derived from a closing-price series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub rsi: Option<f64>,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
}

/// Absolute and percentage change against the previous close.
///
/// Undefined when either price is missing or the previous close is not positive.
pub fn price_change(current: Option<f64>, previous_close: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (current, previous_close) {
        (Some(current), Some(prev)) if prev > 0.0 => {
            let change = current - prev;
            (Some(change), Some(change / prev * 100.0))
        }
        _ => (None, None),
    }
}

/// Price and indicator snapshot for one symbol at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub kind: QuoteKind,
    #[serde(default)]
    pub name: Option<String>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub average_volume: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn from_snapshot(
        symbol: &str,
        kind: QuoteKind,
        snapshot: QuoteSnapshot,
        technicals: TechnicalSnapshot,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let current_price = snapshot.effective_price(kind);
        let (change, change_pct) = price_change(current_price, snapshot.previous_close);

        Self {
            symbol: symbol.to_string(),
            kind,
            name: snapshot.name,
            current_price,
            previous_close: snapshot.previous_close,
            change,
            change_pct,
            rsi: technicals.rsi,
            ma20: technicals.ma20,
            ma50: technicals.ma50,
            volume: snapshot.volume,
            average_volume: snapshot.average_volume,
            market_cap: snapshot.market_cap,
            fifty_two_week_high: snapshot.fifty_two_week_high,
            fifty_two_week_low: snapshot.fifty_two_week_low,
            currency: snapshot.currency,
            exchange: snapshot.exchange,
            fetched_at,
        }
    }

    /// Display name, falling back to the symbol.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}

/// Qualitative bucket for a composite fear & greed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLevel {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl SentimentLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 25.0 => SentimentLevel::ExtremeFear,
            s if s < 45.0 => SentimentLevel::Fear,
            s if s <= 55.0 => SentimentLevel::Neutral,
            s if s <= 75.0 => SentimentLevel::Greed,
            _ => SentimentLevel::ExtremeGreed,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            SentimentLevel::ExtremeFear => "Extreme Fear",
            SentimentLevel::Fear => "Fear",
            SentimentLevel::Neutral => "Neutral",
            SentimentLevel::Greed => "Greed",
            SentimentLevel::ExtremeGreed => "Extreme Greed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub score: f64,
    pub level: SentimentLevel,
    pub fetched_at: DateTime<Utc>,
}

impl SentimentReading {
    pub fn new(score: f64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            score,
            level: SentimentLevel::from_score(score),
            fetched_at,
        }
    }
}

/// Daily move of a sector, proxied by its SPDR sector ETF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector: String,
    pub etf: String,
    pub change_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_pct_exact() {
        let (change, pct) = price_change(Some(110.0), Some(100.0));
        assert_eq!(change, Some(10.0));
        assert_eq!(pct, Some((110.0 - 100.0) / 100.0 * 100.0));
    }

    #[test]
    fn test_change_undefined_without_positive_previous_close() {
        assert_eq!(price_change(Some(110.0), None), (None, None));
        assert_eq!(price_change(Some(110.0), Some(0.0)), (None, None));
        assert_eq!(price_change(Some(110.0), Some(-5.0)), (None, None));
        assert_eq!(price_change(None, Some(100.0)), (None, None));
    }

    #[test]
    fn test_effective_price_fallbacks() {
        let snap = QuoteSnapshot {
            regular_market_price: Some(101.0),
            previous_close: Some(100.0),
            ..Default::default()
        };
        assert_eq!(snap.effective_price(QuoteKind::Equity), Some(101.0));

        let snap = QuoteSnapshot {
            current_price: Some(102.0),
            regular_market_price: Some(101.0),
            previous_close: Some(100.0),
            ..Default::default()
        };
        assert_eq!(snap.effective_price(QuoteKind::Equity), Some(102.0));
        // Indices never report a trade price
        assert_eq!(snap.effective_price(QuoteKind::Index), Some(101.0));

        let snap = QuoteSnapshot {
            previous_close: Some(100.0),
            ..Default::default()
        };
        assert_eq!(snap.effective_price(QuoteKind::Index), Some(100.0));
    }

    #[test]
    fn test_quote_kind_from_symbol() {
        assert_eq!(QuoteKind::from_symbol("^GSPC"), QuoteKind::Index);
        assert_eq!(QuoteKind::from_symbol("NVDA"), QuoteKind::Equity);
        assert_eq!(QuoteKind::Index.cache_prefix(), "index");
    }

    #[test]
    fn test_sentiment_level_thresholds() {
        assert_eq!(SentimentLevel::from_score(0.0), SentimentLevel::ExtremeFear);
        assert_eq!(SentimentLevel::from_score(24.9), SentimentLevel::ExtremeFear);
        assert_eq!(SentimentLevel::from_score(25.0), SentimentLevel::Fear);
        assert_eq!(SentimentLevel::from_score(44.9), SentimentLevel::Fear);
        assert_eq!(SentimentLevel::from_score(45.0), SentimentLevel::Neutral);
        assert_eq!(SentimentLevel::from_score(55.0), SentimentLevel::Neutral);
        assert_eq!(SentimentLevel::from_score(55.1), SentimentLevel::Greed);
        assert_eq!(SentimentLevel::from_score(75.0), SentimentLevel::Greed);
        assert_eq!(SentimentLevel::from_score(75.1), SentimentLevel::ExtremeGreed);
        assert_eq!(SentimentLevel::from_score(100.0), SentimentLevel::ExtremeGreed);
    }

    #[test]
    fn test_quote_from_snapshot_derives_change() {
        let snap = QuoteSnapshot {
            name: Some("NVIDIA Corporation".to_string()),
            current_price: Some(120.0),
            previous_close: Some(100.0),
            ..Default::default()
        };
        let quote = Quote::from_snapshot("NVDA", QuoteKind::Equity, snap, TechnicalSnapshot::default(), Utc::now());
        assert_eq!(quote.change, Some(20.0));
        assert_eq!(quote.change_pct, Some(20.0));
        assert_eq!(quote.display_name(), "NVIDIA Corporation");
        assert!(quote.rsi.is_none());
    }
}
