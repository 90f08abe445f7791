use crate::models::CandleSeries;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BaselineError {
    #[error("Series is empty")]
    Empty,

    #[error("First close {0} is not a positive price")]
    BadFirstClose(f64),
}

/// Value of `starting_cash` invested at the first close and held to the last.
pub fn try_buy_and_hold(series: &CandleSeries, starting_cash: f64) -> Result<f64, BaselineError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) => (f.close, l.close),
        _ => return Err(BaselineError::Empty),
    };
    if !(first > 0.0 && first.is_finite()) {
        return Err(BaselineError::BadFirstClose(first));
    }
    Ok((last / first) * starting_cash)
}

/// Same as [`try_buy_and_hold`] but degrades to 0.0 on failure.
pub fn buy_and_hold(series: &CandleSeries, starting_cash: f64) -> f64 {
    try_buy_and_hold(series, starting_cash).unwrap_or(0.0)
}
