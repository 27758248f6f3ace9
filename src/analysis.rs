//! Deterministic analyses over the meter readings and bills.
//!
//! Everything here is a pure function of its input: no I/O and no shared state, so the analyses
//! may be called concurrently from any thread.

pub mod anomalies;
pub mod cost;
pub mod peaks;
pub mod savings;
pub mod statistics;

use average::Variance;
use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{error::ValidationError, reading::ConsumptionReading};

/// Valid consumption values, failing when there are none.
fn consumption_values(readings: &[ConsumptionReading]) -> Result<Vec<f64>, ValidationError> {
    if readings.is_empty() {
        return Err(ValidationError::EmptyReadings);
    }
    let values = readings
        .iter()
        .filter_map(|reading| reading.consumption)
        .map(|value| value.0)
        .collect_vec();
    if values.is_empty() {
        return Err(ValidationError::NoValidConsumption { n_readings: readings.len() });
    }
    Ok(values)
}

/// Running mean and variance of the values, failing when they overflow.
fn finite_variance(values: &[f64]) -> Result<Variance, ValidationError> {
    let variance: Variance = values.iter().copied().collect();
    if variance.mean().is_finite() && sample_std_dev(&variance).is_finite() {
        Ok(variance)
    } else {
        Err(ValidationError::ConsumptionOverflow)
    }
}

/// Sample standard deviation, or zero for a single value.
fn sample_std_dev(variance: &Variance) -> f64 {
    if variance.len() > 1 { variance.sample_variance().sqrt() } else { 0.0 }
}

fn median(values: &[f64]) -> Option<f64> {
    let sorted = values.iter().copied().map(OrderedFloat).sorted_unstable().collect_vec();
    let index = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        length if length % 2 == 1 => Some(sorted[index].0),
        _ => Some(sorted[index - 1].0 / 2.0 + sorted[index].0 / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[1.0, 0.0, 2.0]), Some(1.0));
    }

    #[test]
    fn test_median_even() {
        assert_abs_diff_eq!(median(&[1.0, 0.0, 2.0, 3.0]).unwrap(), 1.5);
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_consumption_values() {
        assert_eq!(consumption_values(&[]), Err(ValidationError::EmptyReadings));
        assert_eq!(
            consumption_values(&[ConsumptionReading::parse(Some("2024-11-01"), Some("n/a"))]),
            Err(ValidationError::NoValidConsumption { n_readings: 1 }),
        );
    }

    #[test]
    fn test_finite_variance() {
        assert_abs_diff_eq!(finite_variance(&[1.0, 3.0]).unwrap().mean(), 2.0);
        assert_eq!(
            finite_variance(&[1e308, -1e308]).map(|variance| variance.mean()),
            Err(ValidationError::ConsumptionOverflow),
        );
    }
}
