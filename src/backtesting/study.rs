//! Bounded-trial parameter search.
//!
//! A `Study` runs a fixed number of trials against an objective and keeps
//! the best. Parameters are drawn through the [`Trial`] trait so the
//! objective does not care whether values come from a random sampler or
//! are replayed from a fixed set.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::models::StrategyParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{:.2}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Suggested parameters in the order they were drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet(Vec<(String, ParamValue)>);

impl ParamSet {
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.0.iter()
    }

    fn record(&mut self, name: &str, value: ParamValue) {
        self.0.push((name.to_string(), value));
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Source of parameter values for one objective evaluation.
pub trait Trial {
    /// Integer in `[low, high]` inclusive.
    fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> i64;
    /// Float in `[low, high)`.
    fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> f64;
    fn suggest_bool(&mut self, name: &str) -> bool;
    fn params(&self) -> &ParamSet;
}

/// Draws every parameter uniformly from its range.
pub struct RandomTrial<'a> {
    rng: &'a mut StdRng,
    params: ParamSet,
}

impl<'a> RandomTrial<'a> {
    pub fn new(rng: &'a mut StdRng) -> Self {
        Self {
            rng,
            params: ParamSet::default(),
        }
    }

    fn into_params(self) -> ParamSet {
        self.params
    }
}

impl Trial for RandomTrial<'_> {
    fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> i64 {
        let v = if high <= low {
            low
        } else {
            self.rng.random_range(low..=high)
        };
        self.params.record(name, ParamValue::Int(v));
        v
    }

    fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let v = if high <= low {
            low
        } else {
            self.rng.random_range(low..high)
        };
        self.params.record(name, ParamValue::Float(v));
        v
    }

    fn suggest_bool(&mut self, name: &str) -> bool {
        let v = self.rng.random_bool(0.5);
        self.params.record(name, ParamValue::Bool(v));
        v
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }
}

/// Replays preset values, clamped into the requested range. Names
/// without a preset fall back to the low end of the range (or `false`).
#[derive(Debug, Clone, Default)]
pub struct FixedTrial {
    values: HashMap<String, ParamValue>,
    params: ParamSet,
}

impl FixedTrial {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, ParamValue)>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            params: ParamSet::default(),
        }
    }
}

impl Trial for FixedTrial {
    fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> i64 {
        let v = match self.values.get(name) {
            Some(ParamValue::Int(v)) => (*v).min(high).max(low),
            _ => low,
        };
        self.params.record(name, ParamValue::Int(v));
        v
    }

    fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let v = match self.values.get(name) {
            Some(ParamValue::Float(v)) => v.min(high).max(low),
            _ => low,
        };
        self.params.record(name, ParamValue::Float(v));
        v
    }

    fn suggest_bool(&mut self, name: &str) -> bool {
        let v = matches!(self.values.get(name), Some(ParamValue::Bool(true)));
        self.params.record(name, ParamValue::Bool(v));
        v
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }
}

/// What one objective evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Complete { value: f64, params: StrategyParams },
    /// No valid configuration for this draw; nothing was simulated.
    Pruned,
    /// The simulation ran into an error. Scores zero but is kept apart
    /// from a genuine total loss.
    Failed { params: StrategyParams, reason: String },
}

impl TrialOutcome {
    pub fn value(&self) -> f64 {
        match self {
            TrialOutcome::Complete { value, .. } => *value,
            TrialOutcome::Pruned | TrialOutcome::Failed { .. } => 0.0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TrialOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct FrozenTrial {
    pub number: usize,
    pub params: ParamSet,
    pub outcome: TrialOutcome,
}

impl FrozenTrial {
    pub fn value(&self) -> f64 {
        self.outcome.value()
    }
}

/// Maximizing study with a uniform random sampler.
pub struct Study {
    rng: StdRng,
    trials: Vec<FrozenTrial>,
    best: Option<usize>,
}

impl Study {
    pub fn maximize(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            trials: Vec::new(),
            best: None,
        }
    }

    /// Run `n_trials` sequential evaluations of `objective`.
    pub fn optimize<F>(&mut self, n_trials: usize, mut objective: F)
    where
        F: FnMut(&mut RandomTrial<'_>) -> TrialOutcome,
    {
        for _ in 0..n_trials {
            let mut trial = RandomTrial::new(&mut self.rng);
            let outcome = objective(&mut trial);
            let params = trial.into_params();

            let number = self.trials.len();
            debug!(
                "Trial {} finished with value {:.2} and parameters {}",
                number,
                outcome.value(),
                params
            );

            // strict comparison keeps the earliest trial on ties
            let improves = match self.best {
                Some(b) => outcome.value() > self.trials[b].value(),
                None => true,
            };
            self.trials.push(FrozenTrial {
                number,
                params,
                outcome,
            });
            if improves {
                self.best = Some(number);
            }
        }
    }

    pub fn trials(&self) -> &[FrozenTrial] {
        &self.trials
    }

    pub fn best_trial(&self) -> Option<&FrozenTrial> {
        self.best.map(|i| &self.trials[i])
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_trial().map(|t| t.value())
    }

    pub fn best_params(&self) -> Option<&ParamSet> {
        self.best_trial().map(|t| &t.params)
    }

    pub fn failed_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.outcome.is_failed()).count()
    }
}
