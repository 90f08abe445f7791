use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar granularity of a persisted per-ticker series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "4h")]
    FourHour,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Daily, Timeframe::Weekly, Timeframe::FourHour];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::FourHour => "4h",
        }
    }

    /// Suffix of the per-ticker CSV file, e.g. `qqq_daily_10y.csv`.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily_10y",
            Timeframe::Weekly => "weekly_10y",
            Timeframe::FourHour => "4h_729d",
        }
    }

    /// Intraday series measure lookbacks in 365-day years rather than calendar years.
    pub fn is_intraday(&self) -> bool {
        matches!(self, Timeframe::FourHour)
    }

    /// Exact tag lookup; anything but `daily`, `weekly` or `4h` is `None`.
    pub fn from_tag(s: &str) -> Option<Timeframe> {
        Timeframe::ALL.into_iter().find(|tf| tf.as_str() == s)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Download interval requested from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "1wk")]
    Weekly,
}

impl Interval {
    pub const ALL: [Interval; 3] = [Interval::Daily, Interval::Hourly, Interval::Weekly];

    /// Provider interval code
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Hourly => "1h",
            Interval::Weekly => "1wk",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Hourly => "hourly",
            Interval::Weekly => "weekly",
        }
    }

    /// Combined multi-ticker output file, e.g. `data_daily.csv`.
    pub fn combined_file_name(&self) -> String {
        format!("data_{}.csv", self.name())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
