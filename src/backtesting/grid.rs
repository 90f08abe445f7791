use anyhow::{Context, Result};
use std::fmt;
use tracing::{debug, info, warn};

use super::baseline::buy_and_hold;
use super::objective::Objective;
use super::report::{GridReport, ResultRow};
use super::study::Study;
use crate::config::GridConfig;
use crate::data::PriceLoader;
use crate::models::Timeframe;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// One (ticker, timeframe, lookback) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub ticker: String,
    pub timeframe: Timeframe,
    pub years_back: f64,
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.ticker, self.timeframe, self.years_back)
    }
}

/// What happened to a single cell.
#[derive(Debug, Clone)]
pub enum CellOutcome {
    Row(ResultRow),
    /// Series shorter than the configured minimum
    Skipped { bars: usize },
}

/// Walks every grid cell in order: load, baseline, search, record.
pub struct GridRunner {
    config: GridConfig,
    loader: PriceLoader,
}

impl GridRunner {
    pub fn new(config: GridConfig) -> Self {
        let loader = PriceLoader::new(config.data_dir.clone());
        Self { config, loader }
    }

    /// Cells in iteration order: ticker, then timeframe, then lookback.
    pub fn cells(&self) -> Vec<GridCell> {
        let mut cells = Vec::new();
        for ticker in &self.config.tickers {
            for &tf in &self.config.timeframes {
                for &years_back in self.config.periods_for(tf) {
                    cells.push(GridCell {
                        ticker: ticker.clone(),
                        timeframe: tf,
                        years_back,
                    });
                }
            }
        }
        cells
    }

    /// Run the whole grid. A failing cell is reported and the grid moves on.
    pub fn run(&self) -> GridReport {
        let cells = self.cells();
        info!(
            "Grid: {} cells, {} trials each, data in {}",
            cells.len(),
            self.config.n_trials,
            self.loader.root().display()
        );

        let mut report = GridReport::default();
        for (i, cell) in cells.into_iter().enumerate() {
            let seed = self.config.seed.map(|s| s.wrapping_add(i as u64));
            match self.run_cell(&cell, seed) {
                Ok(CellOutcome::Row(row)) => {
                    println!("{}", row.progress_line());
                    report.rows.push(row);
                }
                Ok(CellOutcome::Skipped { bars }) => {
                    debug!("Skipping {}: only {} bars", cell, bars);
                    report.skipped.push(cell);
                }
                Err(e) => {
                    println!(
                        "Error for {} {} {}: {:#}",
                        cell.ticker, cell.timeframe, cell.years_back, e
                    );
                    warn!("Cell {} failed: {:#}", cell, e);
                    report.errors.push((cell, format!("{:#}", e)));
                }
            }
        }

        info!(
            "Grid done: {} rows, {} skipped, {} errors",
            report.rows.len(),
            report.skipped.len(),
            report.errors.len()
        );
        report
    }

    /// Evaluate one cell with an optional sampler seed.
    pub fn run_cell(&self, cell: &GridCell, seed: Option<u64>) -> Result<CellOutcome> {
        let series = self
            .loader
            .load(&cell.ticker, cell.timeframe, Some(cell.years_back))
            .with_context(|| format!("loading {}", cell))?;

        if series.len() < self.config.min_bars {
            return Ok(CellOutcome::Skipped { bars: series.len() });
        }

        let cash = self.config.starting_cash;
        let buy_hold = round2(buy_and_hold(&series, cash));

        let objective = Objective::new(&series, cash);
        let mut study = Study::maximize(seed);
        study.optimize(self.config.n_trials, |trial| objective.evaluate(trial));

        let (Some(best_value), Some(best_params)) = (study.best_value(), study.best_params()) else {
            anyhow::bail!("no trials ran for {}", cell);
        };
        let best_value = round2(best_value);
        let failed = study.failed_trials();
        if failed > 0 {
            warn!("{}: {} of {} trials failed to simulate", cell, failed, study.trials().len());
        }

        Ok(CellOutcome::Row(ResultRow {
            ticker: cell.ticker.to_uppercase(),
            timeframe: cell.timeframe,
            period: cell.years_back,
            best_strategy_value: best_value,
            buy_and_hold_value: buy_hold,
            beat: best_value > buy_hold,
            best_params: best_params.clone(),
            failed_trials: failed,
        }))
    }
}
