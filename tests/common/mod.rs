use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

use crossover_sweep::config::GridConfig;
use crossover_sweep::data::fetcher::write_ticker_csv;
use crossover_sweep::models::{Candle, CandleSeries, Timeframe};

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2015-01-02T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Bars from closes, spaced `step` apart. Each bar opens at the previous close.
pub fn make_series(closes: &[f64], step: Duration) -> CandleSeries {
    let base = base_time();
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let o = if i == 0 { c } else { closes[i - 1] };
            Candle {
                timestamp: base + step * i as i32,
                open: o,
                high: o.max(c) + 0.25,
                low: o.min(c) - 0.25,
                close: c,
                volume: 1_000.0,
            }
        })
        .collect();
    CandleSeries::new(candles)
}

/// Daily closes rising by `step` each bar.
pub fn make_rising_daily(n: usize, start: f64, step: f64) -> CandleSeries {
    let closes: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    make_series(&closes, Duration::days(1))
}

/// Daily closes that oscillate around a slow drift.
pub fn make_wavy_daily(n: usize) -> CandleSeries {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + 8.0 * (i as f64 / 12.0).sin() + i as f64 * 0.03)
        .collect();
    make_series(&closes, Duration::days(1))
}

pub fn write_series(root: &Path, ticker: &str, tf: Timeframe, series: &CandleSeries) -> PathBuf {
    write_ticker_csv(root, ticker, tf, series).unwrap()
}

/// One ticker, daily only, a handful of seeded trials.
pub fn small_grid(root: &Path, ticker: &str, years: Vec<f64>) -> GridConfig {
    GridConfig {
        data_dir: root.to_path_buf(),
        tickers: vec![ticker.to_string()],
        timeframes: vec![Timeframe::Daily],
        daily_weekly_years: years,
        intraday_years: vec![0.5],
        n_trials: 8,
        starting_cash: 100_000.0,
        min_bars: 30,
        seed: Some(42),
    }
}
