use serde::{Deserialize, Serialize};
use std::fmt;

/// One parameterization of the EMA crossover strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub use_atr_filter: bool,
    /// Share of available cash committed on entry, in (0, 1].
    pub fractional_size: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            fast_window: 10,
            slow_window: 30,
            atr_period: 14,
            atr_multiplier: 2.0,
            use_atr_filter: false,
            fractional_size: 1.0,
        }
    }
}

impl StrategyParams {
    /// Checks the shape invariants. Returns a reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.fast_window == 0 || self.atr_period == 0 {
            return Err("window lengths must be positive".to_string());
        }
        if self.fast_window >= self.slow_window {
            return Err(format!(
                "fast_window {} must be below slow_window {}",
                self.fast_window, self.slow_window
            ));
        }
        if !(self.fractional_size > 0.0 && self.fractional_size <= 1.0) {
            return Err(format!(
                "fractional_size {} outside (0, 1]",
                self.fractional_size
            ));
        }
        if !self.atr_multiplier.is_finite() || self.atr_multiplier < 0.0 {
            return Err(format!("atr_multiplier {} invalid", self.atr_multiplier));
        }
        Ok(())
    }

    /// Number of bars the indicators need before the strategy may act.
    pub fn warmup_bars(&self) -> usize {
        // EMA(slow) is ready at index slow-1; ATR needs one extra bar for
        // the first true range.
        self.slow_window.max(self.atr_period + 1)
    }
}

impl fmt::Display for StrategyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{fast_window: {}, slow_window: {}, atr_period: {}, atr_multiplier: {:.2}, use_atr_filter: {}, fractional_size: {:.2}}}",
            self.fast_window,
            self.slow_window,
            self.atr_period,
            self.atr_multiplier,
            self.use_atr_filter,
            self.fractional_size
        )
    }
}
