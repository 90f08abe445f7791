use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

use super::study::ParamSet;
use crate::models::Timeframe;

use super::grid::GridCell;

/// Outcome of one completed grid cell.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub ticker: String,
    pub timeframe: Timeframe,
    /// Lookback in years
    pub period: f64,
    pub best_strategy_value: f64,
    pub buy_and_hold_value: f64,
    pub beat: bool,
    pub best_params: ParamSet,
    /// Trials whose simulation errored (scored as zero)
    pub failed_trials: usize,
}

impl ResultRow {
    pub fn beat_label(&self) -> &'static str {
        if self.beat {
            "YES"
        } else {
            "NO"
        }
    }

    /// Single progress line printed as each cell finishes.
    pub fn progress_line(&self) -> String {
        format!(
            "{} {} {:.2}y: Strategy ${:.2} vs BH ${:.2} -> {}",
            self.ticker,
            self.timeframe,
            self.period,
            self.best_strategy_value,
            self.buy_and_hold_value,
            if self.beat { "Beat" } else { "Did NOT beat" }
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct GridReport {
    pub rows: Vec<ResultRow>,
    /// Cells with too few bars to search
    pub skipped: Vec<GridCell>,
    /// Cells that errored, with the message
    pub errors: Vec<(GridCell, String)>,
}

impl GridReport {
    pub fn beat_count(&self) -> usize {
        self.rows.iter().filter(|r| r.beat).count()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(format!(
            "{:6} {:7} {:7} {:11} {:11} {:9} {}",
            "Ticker", "TF", "Period", "Strategy $", "Buy&Hold $", "Beat BH", "Params"
        ));
        for r in &self.rows {
            lines.push(format!(
                "{:6} {:7} {:7} {:11.2} {:11.2} {:9} {}",
                r.ticker,
                r.timeframe.as_str(),
                format!("{:.2}", r.period),
                r.best_strategy_value,
                r.buy_and_hold_value,
                r.beat_label(),
                r.best_params
            ));
        }
        lines
    }

    pub fn print_summary(&self) {
        println!("\nSummary of results:");
        for line in self.summary_lines() {
            println!("{}", line);
        }

        println!("{}", "=".repeat(70));
        println!(
            "  Cells: {} searched | {} beat buy & hold | {} skipped | {} errors",
            self.rows.len(),
            self.beat_count(),
            self.skipped.len(),
            self.errors.len()
        );
        for (cell, msg) in &self.errors {
            println!("  {}: {}", cell, msg);
        }
        println!("{}", "=".repeat(70));
    }

    /// Write the rows as CSV. Returns the file written.
    pub fn save_csv(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating report dir {}", dir.display()))?;
        let path = dir.join(format!("grid_results_{}.csv", Utc::now().format("%Y%m%d")));
        self.write_csv(&path)?;
        Ok(path)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut w = csv::Writer::from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;
        w.write_record([
            "Ticker",
            "Timeframe",
            "Period (years)",
            "Strategy Value",
            "Buy & Hold",
            "Beat Buy & Hold",
            "Failed Trials",
            "Best Params",
        ])?;
        for r in &self.rows {
            w.write_record([
                r.ticker.clone(),
                r.timeframe.to_string(),
                format!("{:.2}", r.period),
                format!("{:.2}", r.best_strategy_value),
                format!("{:.2}", r.buy_and_hold_value),
                r.beat_label().to_string(),
                r.failed_trials.to_string(),
                r.best_params.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }
}
