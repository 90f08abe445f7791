use tracing::debug;

use super::simulator::{run_backtest, BacktestResult, SimError};
use super::study::{Trial, TrialOutcome};
use crate::models::{CandleSeries, StrategyParams};

const MAX_SLOW_WINDOW: i64 = 150;
const MIN_SLOW_BOUND: i64 = 10;
const MIN_FAST_WINDOW: i64 = 5;
const MIN_ATR_PERIOD: i64 = 5;
const MAX_ATR_PERIOD: i64 = 30;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Scores one parameter draw against a fixed price series.
pub struct Objective<'a> {
    series: &'a CandleSeries,
    starting_cash: f64,
}

impl<'a> Objective<'a> {
    pub fn new(series: &'a CandleSeries, starting_cash: f64) -> Self {
        Self {
            series,
            starting_cash,
        }
    }

    pub fn evaluate<T: Trial>(&self, trial: &mut T) -> TrialOutcome {
        self.evaluate_with(trial, run_backtest)
    }

    /// Draws parameters inside bounds derived from the series length and
    /// hands them to `simulate`. Draws that cannot form a valid window
    /// pair are pruned before `simulate` is called.
    pub fn evaluate_with<T, F>(&self, trial: &mut T, simulate: F) -> TrialOutcome
    where
        T: Trial,
        F: FnOnce(&CandleSeries, &StrategyParams, f64) -> Result<BacktestResult, SimError>,
    {
        let len = self.series.len() as i64;
        let max_slow = MAX_SLOW_WINDOW.min(len - 1);
        if max_slow < MIN_SLOW_BOUND {
            return TrialOutcome::Pruned;
        }

        let fast = trial.suggest_int(
            "fast_window",
            MIN_FAST_WINDOW,
            MIN_FAST_WINDOW.max(max_slow - 10),
        );
        let slow = trial.suggest_int("slow_window", fast + 1, max_slow);
        if slow >= len || fast >= slow {
            return TrialOutcome::Pruned;
        }

        let atr_period = trial.suggest_int("atr_period", MIN_ATR_PERIOD, MAX_ATR_PERIOD.min(len / 2));
        let atr_multiplier = round2(trial.suggest_float("atr_multiplier", 1.0, 4.0));
        let use_atr_filter = trial.suggest_bool("use_atr_filter");
        let fractional_size = round2(trial.suggest_float("fractional_size", 0.1, 1.0));

        let params = StrategyParams {
            fast_window: fast as usize,
            slow_window: slow as usize,
            atr_period: atr_period as usize,
            atr_multiplier,
            use_atr_filter,
            fractional_size,
        };

        match simulate(self.series, &params, self.starting_cash) {
            Ok(result) => TrialOutcome::Complete {
                value: round2(result.terminal_value),
                params,
            },
            Err(e) => {
                debug!("Simulation failed for {}: {}", params, e);
                TrialOutcome::Failed {
                    params,
                    reason: e.to_string(),
                }
            }
        }
    }
}
