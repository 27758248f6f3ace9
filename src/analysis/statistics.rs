use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::{
    analysis::{consumption_values, finite_variance, median, sample_std_dev},
    error::ValidationError,
    prelude::*,
    quantity::energy::KilowattHours,
    reading::ConsumptionReading,
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsumptionStatistics {
    pub mean: KilowattHours,
    pub median: KilowattHours,
    pub std_dev: KilowattHours,
    pub min: KilowattHours,
    pub max: KilowattHours,
    pub total: KilowattHours,
    pub count: usize,
}

impl ConsumptionStatistics {
    /// Summarize the valid consumption values, readings without one are ignored.
    ///
    /// All the fields are rounded to 2 decimals.
    #[instrument(skip_all, fields(n_readings = readings.len()))]
    pub fn try_compute(readings: &[ConsumptionReading]) -> Result<Self, ValidationError> {
        let values = consumption_values(readings)?;
        let variance = finite_variance(&values)?;
        let total: f64 = values.iter().sum();
        if !total.is_finite() {
            return Err(ValidationError::ConsumptionOverflow);
        }
        let (min, max) = values
            .iter()
            .copied()
            .map(OrderedFloat)
            .minmax()
            .into_option()
            .ok_or(ValidationError::NoValidConsumption { n_readings: readings.len() })?;
        let median = median(&values).unwrap_or(min.0);
        let this = Self {
            mean: KilowattHours(variance.mean()).round_to(2),
            median: KilowattHours(median).round_to(2),
            std_dev: KilowattHours(sample_std_dev(&variance)).round_to(2),
            min: KilowattHours(min.0).round_to(2),
            max: KilowattHours(max.0).round_to(2),
            total: KilowattHours(total).round_to(2),
            count: values.len(),
        };
        debug!(count = this.count, n_skipped = readings.len() - this.count, "done");
        Ok(this)
    }
}
