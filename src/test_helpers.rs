use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

use crate::config::GridConfig;
use crate::models::{Candle, CandleSeries, Timeframe};

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples with auto-incrementing daily timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let base = base_time();

    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + Duration::days(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

/// Daily candles from closes only. Each bar opens at the previous close.
pub fn make_closes(closes: &[f64]) -> CandleSeries {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let o = if i == 0 { c } else { closes[i - 1] };
            (o, o.max(c), o.min(c), c)
        })
        .collect();
    make_candles(&data)
}

pub fn make_flat(n: usize, price: f64) -> CandleSeries {
    make_closes(&vec![price; n])
}

/// n strictly rising closes: start, start + step, ...
pub fn make_rising(n: usize, start: f64, step: f64) -> CandleSeries {
    let closes: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    make_closes(&closes)
}

/// Write a series where the loader expects it under `root`.
pub fn write_series_csv(
    root: &Path,
    ticker: &str,
    tf: Timeframe,
    series: &CandleSeries,
) -> PathBuf {
    let t = ticker.to_lowercase();
    let dir = root.join(&t);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}_{}.csv", t, tf.file_suffix()));

    let mut w = csv::Writer::from_path(&path).unwrap();
    w.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])
        .unwrap();
    for c in series {
        w.write_record([
            c.timestamp.format("%Y-%m-%d").to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])
        .unwrap();
    }
    w.flush().unwrap();
    path
}

/// A GridConfig suitable for testing: one ticker, daily only, seeded search.
pub fn default_test_config(data_dir: &Path) -> GridConfig {
    GridConfig {
        data_dir: data_dir.to_path_buf(),
        tickers: vec!["test".to_string()],
        timeframes: vec![Timeframe::Daily],
        daily_weekly_years: vec![1.0],
        intraday_years: vec![0.5],
        n_trials: 5,
        starting_cash: 100_000.0,
        min_bars: 30,
        seed: Some(7),
    }
}
