pub mod baseline;
pub mod grid;
pub mod indicators;
pub mod objective;
pub mod report;
pub mod simulator;
pub mod study;

pub use baseline::buy_and_hold;
pub use grid::{GridCell, GridRunner};
pub use report::{GridReport, ResultRow};
pub use simulator::{run_backtest, BacktestResult, SimError};
pub use study::{Study, Trial, TrialOutcome};
