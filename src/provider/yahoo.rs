use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::{Candle, CandleSeries, Interval};
use crate::provider::MarketData;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

/// Yahoo Finance chart endpoint client. Unadjusted prices.
pub struct YahooClient {
    client: Client,
    base_url: String,
    last_request: Option<Instant>,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            last_request: None,
        }
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn fetch_bars(
        &mut self,
        ticker: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries> {
        self.rate_limit().await;

        let url = format!("{}/{}", self.base_url, ticker);
        debug!("GET {} {} {}..{}", url, interval, start, end);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", interval.as_str().to_string()),
                ("includePrePost", "false".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} {} bars", ticker, interval))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo API error {} for {}: {}", status, ticker, body);
        }

        let body = resp.text().await.context("Failed to read chart response")?;
        let data: ChartResponse =
            serde_json::from_str(&body).context("Failed to parse chart response")?;

        parse_chart(data).with_context(|| format!("Bad chart payload for {}", ticker))
    }
}

/// Zip the parallel quote arrays into candles, dropping any bar with a
/// missing price field.
fn parse_chart(data: ChartResponse) -> Result<CandleSeries> {
    if let Some(err) = data.chart.error {
        anyhow::bail!("Yahoo error: {} - {}", err.code, err.description);
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("No data returned")?;

    // symbols with no bars in range come back without timestamps
    let timestamps = match result.timestamp {
        Some(ts) => ts,
        None => return Ok(CandleSeries::default()),
    };
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .context("No quote data")?;

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let candles: Vec<Candle> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(Candle {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: at(&quote.open, i)?,
                high: at(&quote.high, i)?,
                low: at(&quote.low, i)?,
                close: at(&quote.close, i)?,
                volume: at(&quote.volume, i).unwrap_or(0.0),
            })
        })
        .collect();

    Ok(CandleSeries::normalized(candles))
}
