use crate::models::Timeframe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the grid driver needs, passed in explicitly so single
/// cells can be exercised in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub data_dir: PathBuf,
    pub tickers: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    /// Lookbacks (years) for daily and weekly series
    pub daily_weekly_years: Vec<f64>,
    /// Lookbacks (years) for the 4h series
    pub intraday_years: Vec<f64>,
    pub n_trials: usize,
    pub starting_cash: f64,
    /// Cells with fewer bars are skipped
    pub min_bars: usize,
    /// Fixed sampler seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("stock_data"),
            tickers: ["xlk", "iwm", "qqq", "aapl"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeframes: Timeframe::ALL.to_vec(),
            daily_weekly_years: (1..=10).map(|y| y as f64).collect(),
            intraday_years: vec![0.5, 1.0, 1.5, 2.0],
            n_trials: 20,
            starting_cash: 100_000.0,
            min_bars: 30,
            seed: None,
        }
    }
}

impl GridConfig {
    pub fn periods_for(&self, tf: Timeframe) -> &[f64] {
        if tf.is_intraday() {
            &self.intraday_years
        } else {
            &self.daily_weekly_years
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub tickers: Vec<String>,
    pub output_dir: PathBuf,
    /// Calendar days back for daily and weekly downloads
    pub daily_weekly_days: i64,
    /// Provider caps sub-daily history at two years
    pub hourly_days: i64,
    /// Also split downloads into the per-ticker layout the grid reads
    pub per_ticker: bool,
    pub per_ticker_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            tickers: ["QQQ", "SPY", "IWM", "IBIT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_dir: PathBuf::from("."),
            daily_weekly_days: 7 * 365,
            hourly_days: 729,
            per_ticker: true,
            per_ticker_dir: PathBuf::from("stock_data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub fetch: FetchConfig,

    // Output
    pub report_dir: PathBuf,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let list = |raw: String| -> Vec<String> {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let grid_defaults = GridConfig::default();
        let fetch_defaults = FetchConfig::default();
        let data_dir = PathBuf::from(env("STOCK_DATA_DIR", "stock_data"));

        let grid = GridConfig {
            data_dir: data_dir.clone(),
            tickers: list(env("GRID_TICKERS", &grid_defaults.tickers.join(","))),
            n_trials: env("GRID_TRIALS", "20").parse().unwrap_or(20),
            starting_cash: env("STARTING_CASH", "100000")
                .parse()
                .unwrap_or(100_000.0),
            min_bars: env("MIN_BARS", "30").parse().unwrap_or(30),
            seed: std::env::var("GRID_SEED").ok().and_then(|s| s.parse().ok()),
            ..grid_defaults
        };

        let fetch = FetchConfig {
            tickers: list(env("FETCH_TICKERS", &fetch_defaults.tickers.join(","))),
            output_dir: PathBuf::from(env("FETCH_OUTPUT_DIR", ".")),
            per_ticker: env("FETCH_PER_TICKER", "true").to_lowercase() == "true",
            per_ticker_dir: data_dir,
            ..fetch_defaults
        };

        Config {
            grid,
            fetch,
            report_dir: PathBuf::from(env("REPORT_DIR", "reports")),
            log_level: env("LOG_LEVEL", "info"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_defaults_match_batch_constants() {
        let g = GridConfig::default();
        assert_eq!(g.tickers, vec!["xlk", "iwm", "qqq", "aapl"]);
        assert_eq!(g.timeframes.len(), 3);
        assert_eq!(g.daily_weekly_years.len(), 10);
        assert_eq!(g.n_trials, 20);
        assert!((g.starting_cash - 100_000.0).abs() < 1e-9);
        assert_eq!(g.min_bars, 30);
    }

    #[test]
    fn periods_depend_on_timeframe() {
        let g = GridConfig::default();
        assert_eq!(g.periods_for(Timeframe::FourHour), &[0.5, 1.0, 1.5, 2.0]);
        assert_eq!(g.periods_for(Timeframe::Weekly).len(), 10);
    }

    #[test]
    fn fetch_defaults() {
        let f = FetchConfig::default();
        assert_eq!(f.tickers, vec!["QQQ", "SPY", "IWM", "IBIT"]);
        assert_eq!(f.daily_weekly_days, 2555);
        assert_eq!(f.hourly_days, 729);
    }
}
