pub mod backtesting;
pub mod config;
pub mod data;
pub mod models;
pub mod provider;
#[cfg(test)]
pub mod test_helpers;
