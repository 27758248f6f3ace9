use crate::quantity::{energy::KilowattHours, percentage::Percentage, rate::KilowattHourRate};

/// Precondition violation of an analysis.
///
/// Analyses skip individual malformed readings, so these are only raised when nothing usable
/// remains or when a scalar parameter is out of its domain.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("consumption readings must not be empty")]
    EmptyReadings,

    #[error("no valid `consumption_kwh` values found in {n_readings} readings")]
    NoValidConsumption { n_readings: usize },

    #[error("consumption values are too large to aggregate")]
    ConsumptionOverflow,

    #[error("could not extract hourly consumption from {n_readings} readings")]
    NoHourlyConsumption { n_readings: usize },

    #[error("number of peak hours must be at least 1")]
    ZeroTopN,

    #[error("consumption must be greater than 0, got {0}")]
    NonPositiveConsumption(KilowattHours),

    #[error("rate tiers must not be empty")]
    EmptyTariff,

    #[error("rate must be greater than 0, got {0}")]
    NonPositiveRate(KilowattHourRate),

    #[error("tier `{tier}` has no rate")]
    MissingRate { tier: String },

    #[error("threshold of tier `{tier}` must be greater than 0, got {threshold}")]
    NonPositiveThreshold { tier: String, threshold: KilowattHours },

    #[error("reduction percentage must be between 0 and 100, got {0}")]
    ReductionOutOfRange(Percentage),

    #[error("anomaly threshold must be a positive number of standard deviations, got {0}")]
    NonPositiveSigmas(f64),
}
