//! Streaming indicators fed one bar at a time.
//!
//! Each indicator returns `None` until it has seen enough input to
//! produce its first value.

use crate::models::Candle;

/// Exponential moving average seeded with the simple average of the
/// first `period` inputs.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        self.seen += 1;
        self.value = match self.value {
            // written as a delta so a constant input stays exactly constant
            Some(prev) => Some(prev + self.alpha * (input - prev)),
            None => {
                self.seed_sum += input;
                (self.seen >= self.period).then(|| self.seed_sum / self.period as f64)
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Wilder-smoothed average true range. The first bar has no previous
/// close and yields no true range.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    ranges: usize,
    value: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            ranges: 0,
            value: None,
        }
    }

    pub fn next(&mut self, candle: &Candle) -> Option<f64> {
        let prev_close = self.prev_close.replace(candle.close);
        if prev_close.is_none() {
            return None;
        }

        let tr = candle.true_range(prev_close);
        self.ranges += 1;
        let n = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (n - 1.0) + tr) / n),
            None => {
                self.seed_sum += tr;
                (self.ranges >= self.period).then(|| self.seed_sum / n)
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_candles, make_flat};

    #[test]
    fn ema_seeds_with_sma() {
        let mut ema = Ema::new(3);
        assert_eq!(ema.next(1.0), None);
        assert_eq!(ema.next(2.0), None);
        let seed = ema.next(3.0).unwrap();
        assert!((seed - 2.0).abs() < 1e-9);
        // alpha = 0.5
        let v = ema.next(6.0).unwrap();
        assert!((v - 4.0).abs() < 1e-9);
    }

    #[test]
    fn ema_constant_input_is_exact() {
        let mut ema = Ema::new(7);
        for _ in 0..50 {
            ema.next(123.45);
        }
        assert_eq!(ema.value(), Some(123.45));
    }

    #[test]
    fn atr_waits_for_period_true_ranges() {
        let s = make_candles(&[
            (10.0, 11.0, 9.0, 10.0),
            (10.0, 12.0, 10.0, 11.0), // tr 2
            (11.0, 11.0, 8.0, 9.0),   // tr 3
            (9.0, 13.0, 9.0, 12.0),   // tr 4
        ]);
        let mut atr = Atr::new(2);
        assert_eq!(atr.next(&s[0]), None);
        assert_eq!(atr.next(&s[1]), None);
        let seed = atr.next(&s[2]).unwrap();
        assert!((seed - 2.5).abs() < 1e-9);
        let v = atr.next(&s[3]).unwrap();
        assert!((v - 3.25).abs() < 1e-9);
    }

    #[test]
    fn atr_of_flat_series_is_zero() {
        let s = make_flat(20, 50.0);
        let mut atr = Atr::new(5);
        for c in &s {
            atr.next(c);
        }
        assert_eq!(atr.value(), Some(0.0));
    }
}
