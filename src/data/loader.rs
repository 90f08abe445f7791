use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::{Candle, CandleSeries, Timeframe};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),

    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unparseable date {value:?} in {}", path.display())]
    BadDate { path: PathBuf, value: String },
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

/// Reads per-ticker bar files laid out as
/// `<root>/<ticker>/<ticker>_<suffix>.csv` (ticker lower-cased).
#[derive(Debug, Clone)]
pub struct PriceLoader {
    root: PathBuf,
}

impl PriceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, ticker: &str, tf: Timeframe) -> PathBuf {
        let t = ticker.to_lowercase();
        self.root
            .join(&t)
            .join(format!("{}_{}.csv", t, tf.file_suffix()))
    }

    /// Load by timeframe tag (`daily`, `weekly`, `4h`).
    pub fn load_tag(
        &self,
        ticker: &str,
        timeframe: &str,
        years_back: Option<f64>,
    ) -> Result<CandleSeries, LoadError> {
        let tf = Timeframe::from_tag(timeframe)
            .ok_or_else(|| LoadError::UnsupportedTimeframe(timeframe.to_string()))?;
        self.load(ticker, tf, years_back)
    }

    /// Load a ticker's series, optionally keeping only the most recent
    /// `years_back` measured from the last bar.
    pub fn load(
        &self,
        ticker: &str,
        tf: Timeframe,
        years_back: Option<f64>,
    ) -> Result<CandleSeries, LoadError> {
        let path = self.path_for(ticker, tf);
        if !path.exists() {
            return Err(LoadError::NotFound(path));
        }

        let series = read_bars(&path)?;
        debug!("Loaded {} bars from {}", series.len(), path.display());

        Ok(match years_back {
            Some(years) if years > 0.0 => truncate(&series, tf, years),
            _ => series,
        })
    }
}

fn read_bars(path: &Path) -> Result<CandleSeries, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut candles = Vec::new();

    for row in reader.deserialize::<RawBar>() {
        let raw = row.map_err(csv_err)?;
        let timestamp = parse_date(&raw.date).ok_or_else(|| LoadError::BadDate {
            path: path.to_path_buf(),
            value: raw.date.clone(),
        })?;
        candles.push(Candle {
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume.unwrap_or(0.0),
        });
    }

    Ok(CandleSeries::normalized(candles))
}

/// Accepts the date shapes pandas writes for daily and intraday indexes.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Start of the lookback window ending at `last`.
pub fn lookback_start(last: DateTime<Utc>, tf: Timeframe, years: f64) -> DateTime<Utc> {
    if tf.is_intraday() {
        last - Duration::days((years * 365.0) as i64)
    } else {
        let months = (years * 12.0).round() as u32;
        last.checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn truncate(series: &CandleSeries, tf: Timeframe, years: f64) -> CandleSeries {
    match series.last() {
        Some(last) => series.since(lookback_start(last.timestamp, tf, years)),
        None => series.clone(),
    }
}
