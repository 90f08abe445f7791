use tracing::trace;

use super::indicators::{Atr, Ema};
use crate::models::{CandleSeries, StrategyParams};

/// Relative slack when checking an entry's cost against cash, so that
/// a full-size entry filled at the signal price is not lost to rounding.
const CASH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("Invalid strategy parameters: {0}")]
    InvalidParams(String),

    #[error("Series has {have} bars, strategy needs at least {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("Non-positive or non-finite price at bar {0}")]
    InvalidPrice(usize),

    #[error("Starting cash must be positive (got {0})")]
    NonPositiveCash(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Cash plus the open position marked at the last close
    pub terminal_value: f64,
    pub entries: usize,
    pub exits: usize,
    /// Entries refused at fill because the cost exceeded cash
    pub rejected_orders: usize,
    pub position_open: bool,
}

#[derive(Debug, Clone, Copy)]
enum PendingOrder {
    Buy { size: f64 },
    Close,
}

/// Replays `series` bar by bar under the EMA crossover rule.
///
/// Signals are evaluated on each bar's close and filled as market
/// orders at the next bar's open. At most one long position is held;
/// an order created on the final bar never fills.
pub fn run_backtest(
    series: &CandleSeries,
    params: &StrategyParams,
    starting_cash: f64,
) -> Result<BacktestResult, SimError> {
    params.validate().map_err(SimError::InvalidParams)?;
    if !(starting_cash > 0.0 && starting_cash.is_finite()) {
        return Err(SimError::NonPositiveCash(starting_cash));
    }
    let need = params.warmup_bars();
    if series.len() < need {
        return Err(SimError::InsufficientData {
            have: series.len(),
            need,
        });
    }
    if let Some(i) = series.iter().position(|c| {
        !(c.open > 0.0 && c.close > 0.0 && c.open.is_finite() && c.close.is_finite())
    }) {
        return Err(SimError::InvalidPrice(i));
    }

    let mut fast = Ema::new(params.fast_window);
    let mut slow = Ema::new(params.slow_window);
    let mut atr = Atr::new(params.atr_period);

    let mut cash = starting_cash;
    let mut position = 0.0f64;
    let mut pending: Option<PendingOrder> = None;
    let mut prev_averages: Option<(f64, f64)> = None;
    let mut prev_close: Option<f64> = None;

    let mut entries = 0;
    let mut exits = 0;
    let mut rejected_orders = 0;

    for (i, candle) in series.iter().enumerate() {
        match pending.take() {
            Some(PendingOrder::Buy { size }) => {
                let cost = size * candle.open;
                if cost > cash * (1.0 + CASH_EPSILON) {
                    rejected_orders += 1;
                    trace!("bar {}: entry rejected, cost {:.2} > cash {:.2}", i, cost, cash);
                } else {
                    cash = (cash - cost).max(0.0);
                    position = size;
                    entries += 1;
                    trace!("bar {}: bought {:.4} @ {:.2}", i, size, candle.open);
                }
            }
            Some(PendingOrder::Close) => {
                cash += position * candle.open;
                trace!("bar {}: sold {:.4} @ {:.2}", i, position, candle.open);
                position = 0.0;
                exits += 1;
            }
            None => {}
        }

        let f = fast.next(candle.close);
        let s = slow.next(candle.close);
        let a = atr.next(candle);

        if let (Some(f), Some(s), Some(a)) = (f, s, a) {
            // Only the first bar with a slow average has no prior pair. It
            // counts as coincident, so both relations hold.
            let was_at_or_below = prev_averages.map_or(true, |(pf, ps)| pf <= ps);
            let was_at_or_above = prev_averages.map_or(true, |(pf, ps)| pf >= ps);

            if position == 0.0 {
                if f > s && was_at_or_below {
                    let blocked = params.use_atr_filter
                        && prev_close
                            .map_or(false, |pc| candle.close < pc + params.atr_multiplier * a);
                    if !blocked {
                        let size = cash * params.fractional_size / candle.close;
                        if size > 0.0 {
                            pending = Some(PendingOrder::Buy { size });
                        }
                    }
                }
            } else if f < s && was_at_or_above {
                pending = Some(PendingOrder::Close);
            }
        }

        // tracked while ATR is still warming up
        if let (Some(f), Some(s)) = (f, s) {
            prev_averages = Some((f, s));
        }

        prev_close = Some(candle.close);
    }

    let last_close = series.last().map(|c| c.close).unwrap_or(0.0);

    Ok(BacktestResult {
        terminal_value: cash + position * last_close,
        entries,
        exits,
        rejected_orders,
        position_open: position > 0.0,
    })
}
