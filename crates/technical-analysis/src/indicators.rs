use market_core::{PricePoint, TechnicalSnapshot};

pub const RSI_PERIOD: usize = 14;
pub const SHORT_MA_WINDOW: usize = 20;
pub const LONG_MA_WINDOW: usize = 50;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Mean of the last `window` closes, or `None` when the series is shorter.
pub fn moving_average(data: &[f64], window: usize) -> Option<f64> {
    if window == 0 || data.len() < window {
        return None;
    }
    sma(&data[data.len() - window..], window).last().copied()
}

/// Relative Strength Index over the whole series, rounded to one decimal.
///
/// Averages are seeded with the simple mean of the first `period` deltas and
/// then smoothed with `(avg * (period - 1) + value) / period` for every later
/// delta. Returns `None` with fewer than `period + 1` closes.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(round_to(100.0 - (100.0 / (1.0 + rs)), 1))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// RSI(14), MA20 and MA50 from one closing-price series (oldest first).
pub fn technical_snapshot(closes: &[f64]) -> TechnicalSnapshot {
    TechnicalSnapshot {
        rsi: rsi(closes, RSI_PERIOD),
        ma20: moving_average(closes, SHORT_MA_WINDOW),
        ma50: moving_average(closes, LONG_MA_WINDOW),
    }
}

pub fn closes(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.close).collect()
}
