pub mod yahoo;

pub use yahoo::YahooClient;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CandleSeries, Interval};

/// Source of historical bars.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Bars for `ticker` in `[start, end)`, oldest first.
    async fn fetch_bars(
        &mut self,
        ticker: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries>;
}
