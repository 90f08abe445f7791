mod common;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;

use crossover_sweep::backtesting::{buy_and_hold, run_backtest, GridRunner};
use crossover_sweep::config::FetchConfig;
use crossover_sweep::data::{fetch_and_save, PriceLoader};
use crossover_sweep::models::{CandleSeries, Interval, StrategyParams, Timeframe};
use crossover_sweep::provider::MarketData;

/// Serves canned series keyed by (ticker, interval).
struct MockProvider {
    data: HashMap<(String, Interval), CandleSeries>,
}

impl MockProvider {
    fn new(tickers: &[&str]) -> Self {
        let mut data = HashMap::new();
        for (k, t) in tickers.iter().enumerate() {
            let start = 50.0 + k as f64 * 10.0;
            let closes: Vec<f64> = (0..400).map(|i| start + i as f64 * 0.2).collect();
            data.insert(
                (t.to_string(), Interval::Daily),
                common::make_series(&closes, Duration::days(1)),
            );
            data.insert(
                (t.to_string(), Interval::Weekly),
                common::make_series(&closes[..80], Duration::days(7)),
            );
            data.insert(
                (t.to_string(), Interval::Hourly),
                common::make_series(&closes, Duration::hours(1)),
            );
        }
        Self { data }
    }
}

#[async_trait]
impl MarketData for MockProvider {
    async fn fetch_bars(
        &mut self,
        ticker: &str,
        interval: Interval,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<CandleSeries> {
        Ok(self
            .data
            .get(&(ticker.to_string(), interval))
            .cloned()
            .unwrap_or_default())
    }
}

#[test]
fn forty_bar_series_loads_in_full() {
    let dir = tempfile::tempdir().unwrap();
    common::write_series(
        dir.path(),
        "TEST",
        Timeframe::Daily,
        &common::make_rising_daily(40, 100.0, 1.0),
    );
    let loader = PriceLoader::new(dir.path());
    let s = loader.load_tag("TEST", "daily", None).unwrap();
    assert_eq!(s.len(), 40);
}

#[test]
fn buy_and_hold_and_simulator_agree_on_flat_prices() {
    let s = common::make_series(&[75.0; 120], Duration::days(1));
    assert_eq!(buy_and_hold(&s, 100_000.0), 100_000.0);
    let r = run_backtest(&s, &StrategyParams::default(), 100_000.0).unwrap();
    assert_eq!(r.entries, 0);
    assert_eq!(r.terminal_value, 100_000.0);
}

#[test]
fn rising_prices_enter_once_and_never_exit() {
    let s = common::make_rising_daily(200, 20.0, 0.5);
    let r = run_backtest(&s, &StrategyParams::default(), 100_000.0).unwrap();
    assert_eq!(r.entries, 1);
    assert_eq!(r.exits, 0);
    assert!(r.position_open);
}

#[test]
fn grid_skips_short_cells_and_reports_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    // ~2.2 years of daily bars: the 1y cell has enough bars, and so does 3y
    common::write_series(dir.path(), "wavy", Timeframe::Daily, &common::make_wavy_daily(800));
    common::write_series(dir.path(), "tiny", Timeframe::Daily, &common::make_rising_daily(25, 10.0, 1.0));

    let mut cfg = common::small_grid(dir.path(), "wavy", vec![1.0, 3.0]);
    cfg.tickers.push("tiny".to_string());
    let report = GridRunner::new(cfg).run();

    assert_eq!(report.rows.len(), 2);
    assert!(report.rows.iter().all(|r| r.ticker == "WAVY"));
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped.iter().all(|c| c.ticker == "tiny"));
    assert!(report.errors.is_empty());

    for row in &report.rows {
        assert!(row.best_strategy_value > 0.0);
        assert_eq!(row.beat, row.best_strategy_value > row.buy_and_hold_value);
        assert!(!row.best_params.is_empty());
    }

    let out = tempfile::tempdir().unwrap();
    let path = report.save_csv(out.path()).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn fetched_files_feed_the_grid() {
    let dir = tempfile::tempdir().unwrap();
    let stock_dir = dir.path().join("stock_data");
    let cfg = FetchConfig {
        tickers: vec!["QQQ".to_string(), "IWM".to_string()],
        output_dir: dir.path().to_path_buf(),
        per_ticker: true,
        per_ticker_dir: stock_dir.clone(),
        ..FetchConfig::default()
    };
    let mut provider = MockProvider::new(&["QQQ", "IWM"]);
    let today = NaiveDate::from_ymd_opt(2016, 3, 1).unwrap();
    let files = fetch_and_save(&mut provider, &cfg, today).await.unwrap();
    assert_eq!(files.len(), 9);

    let daily = std::fs::read_to_string(dir.path().join("data_daily.csv")).unwrap();
    let mut lines = daily.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Ticker,QQQ,QQQ,QQQ,QQQ,QQQ,IWM,IWM,IWM,IWM,IWM"
    );
    assert!(lines.next().unwrap().starts_with("Date,Open,High,Low,Close,Volume"));
    assert_eq!(daily.lines().count(), 2 + 400);

    // 400 hourly bars from midnight resample to 100 four-hour bars
    let loader = PriceLoader::new(&stock_dir);
    assert_eq!(loader.load("iwm", Timeframe::FourHour, None).unwrap().len(), 100);

    let mut grid = common::small_grid(&stock_dir, "qqq", vec![1.0]);
    grid.timeframes = Timeframe::ALL.to_vec();
    grid.intraday_years = vec![0.01, 0.5];
    let report = GridRunner::new(grid).run();

    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    // daily 1y and weekly 1y searched; 4h 0.01y (3 days, 19 bars) skipped
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].timeframe, Timeframe::FourHour);
    assert_eq!(report.rows.len(), 3);
}
