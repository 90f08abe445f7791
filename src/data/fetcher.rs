use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::models::{CandleSeries, Interval, Timeframe};
use crate::provider::MarketData;

const FIELDS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];
const FOUR_HOURS: StdDuration = StdDuration::from_secs(4 * 3600);

/// Download date range per interval group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchWindows {
    pub end: DateTime<Utc>,
    pub daily_weekly_start: DateTime<Utc>,
    pub hourly_start: DateTime<Utc>,
}

impl FetchWindows {
    pub fn for_today(today: NaiveDate, cfg: &FetchConfig) -> Self {
        let end = today.and_time(chrono::NaiveTime::MIN).and_utc();
        Self {
            end,
            daily_weekly_start: end - Duration::days(cfg.daily_weekly_days),
            hourly_start: end - Duration::days(cfg.hourly_days),
        }
    }

    pub fn start_for(&self, interval: Interval) -> DateTime<Utc> {
        match interval {
            Interval::Hourly => self.hourly_start,
            Interval::Daily | Interval::Weekly => self.daily_weekly_start,
        }
    }
}

/// Bars for each ticker, in ticker order.
pub type TickerBars = Vec<(String, CandleSeries)>;

/// Fetch one interval for every ticker. Provider errors propagate.
pub async fn fetch_interval<P: MarketData + ?Sized>(
    provider: &mut P,
    tickers: &[String],
    interval: Interval,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<TickerBars> {
    let mut out = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let series = provider
            .fetch_bars(ticker, interval, start, end)
            .await
            .with_context(|| format!("downloading {} {}", ticker, interval))?;
        info!("  {} {}: {} bars", ticker, interval, series.len());
        out.push((ticker.clone(), series));
    }
    Ok(out)
}

fn format_ts(ts: DateTime<Utc>, interval: Interval) -> String {
    match interval {
        Interval::Hourly => ts.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        Interval::Daily | Interval::Weekly => ts.format("%Y-%m-%d").to_string(),
    }
}

/// Write a wide table with a two-row (ticker, field) header. Rows are the
/// union of all tickers' timestamps; a ticker without a bar at a
/// timestamp leaves its cells empty.
pub fn write_combined_csv(path: &Path, interval: Interval, bars: &[(String, CandleSeries)]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut tickers = vec!["Ticker".to_string()];
    let mut fields = vec!["Date".to_string()];
    for (ticker, _) in bars {
        for field in FIELDS {
            tickers.push(ticker.clone());
            fields.push(field.to_string());
        }
    }
    w.write_record(&tickers)?;
    w.write_record(&fields)?;

    let stamps: BTreeSet<DateTime<Utc>> = bars
        .iter()
        .flat_map(|(_, s)| s.iter().map(|c| c.timestamp))
        .collect();

    // one cursor per ticker; every series is sorted so each advances at most once per row
    let mut cursors = vec![0usize; bars.len()];
    for ts in stamps {
        let mut record = Vec::with_capacity(1 + bars.len() * FIELDS.len());
        record.push(format_ts(ts, interval));
        for ((_, series), cursor) in bars.iter().zip(cursors.iter_mut()) {
            match series.get(*cursor).filter(|c| c.timestamp == ts) {
                Some(c) => {
                    *cursor += 1;
                    record.extend([c.open, c.high, c.low, c.close, c.volume].map(|v| v.to_string()));
                }
                None => record.extend(std::iter::repeat(String::new()).take(FIELDS.len())),
            }
        }
        w.write_record(&record)?;
    }

    w.flush()?;
    Ok(())
}

/// Write one ticker's bars where the grid's loader looks for them.
pub fn write_ticker_csv(root: &Path, ticker: &str, tf: Timeframe, series: &CandleSeries) -> Result<PathBuf> {
    let t = ticker.to_lowercase();
    let dir = root.join(&t);
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}_{}.csv", t, tf.file_suffix()));

    let interval = if tf.is_intraday() {
        Interval::Hourly
    } else {
        Interval::Daily
    };

    let mut w = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])?;
    for c in series {
        w.write_record([
            format_ts(c.timestamp, interval),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(path)
}

fn per_ticker_timeframe(interval: Interval) -> Timeframe {
    match interval {
        Interval::Daily => Timeframe::Daily,
        Interval::Weekly => Timeframe::Weekly,
        Interval::Hourly => Timeframe::FourHour,
    }
}

/// Download every interval and persist the combined tables, plus the
/// per-ticker split when enabled. Returns the files written.
pub async fn fetch_and_save<P: MarketData + ?Sized>(
    provider: &mut P,
    cfg: &FetchConfig,
    today: NaiveDate,
) -> Result<Vec<PathBuf>> {
    let windows = FetchWindows::for_today(today, cfg);
    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;

    let mut written = Vec::new();

    for interval in Interval::ALL {
        let start = windows.start_for(interval);
        info!(
            "Downloading {} data ({} to {})...",
            interval.name(),
            start.format("%Y-%m-%d"),
            windows.end.format("%Y-%m-%d")
        );

        let bars = fetch_interval(provider, &cfg.tickers, interval, start, windows.end).await?;

        let path = cfg.output_dir.join(interval.combined_file_name());
        write_combined_csv(&path, interval, &bars)?;
        info!("  Saved {}", path.display());
        written.push(path);

        if !cfg.per_ticker {
            continue;
        }

        let tf = per_ticker_timeframe(interval);
        for (ticker, series) in &bars {
            let series = if tf.is_intraday() {
                series.resample(FOUR_HOURS)
            } else {
                series.clone()
            };
            if series.is_empty() {
                warn!("  No {} bars for {}, skipping split file", tf, ticker);
                continue;
            }
            written.push(write_ticker_csv(&cfg.per_ticker_dir, ticker, tf, &series)?);
        }
    }

    Ok(written)
}
