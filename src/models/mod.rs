pub mod candle;
pub mod params;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use params::StrategyParams;
pub use timeframe::{Interval, Timeframe};
