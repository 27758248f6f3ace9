use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    analysis::{consumption_values, finite_variance, sample_std_dev},
    error::ValidationError,
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, percentage::Percentage, rate::KilowattHourRate},
    reading::ConsumptionReading,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    #[display("spike")]
    Spike,

    #[display("drop")]
    Drop,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[display("low")]
    Low,

    #[display("medium")]
    Medium,

    #[display("high")]
    High,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Anomaly {
    pub timestamp: Option<NaiveDateTime>,

    #[serde(rename = "consumption_kwh")]
    pub consumption: KilowattHours,

    /// Mean consumption of the series.
    #[serde(rename = "expected_kwh")]
    pub expected: KilowattHours,

    /// Deviation from the mean relative to the mean, absent when the mean is zero.
    pub deviation_percentage: Option<Percentage>,

    pub z_score: f64,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,

    /// Cost of the deviation from the mean, negative for drops.
    pub cost_impact: Cost,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnomalySummary {
    pub total_anomalies: usize,
    pub high_severity_count: usize,

    /// Total cost of the spikes above the mean.
    pub estimated_waste: Cost,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnomalyReport {
    #[serde(rename = "mean_kwh")]
    pub mean: KilowattHours,

    #[serde(rename = "std_dev_kwh")]
    pub std_dev: KilowattHours,

    #[serde(rename = "lower_threshold_kwh")]
    pub lower_threshold: KilowattHours,

    #[serde(rename = "upper_threshold_kwh")]
    pub upper_threshold: KilowattHours,

    pub anomalies: Vec<Anomaly>,
    pub summary: AnomalySummary,
}

impl AnomalyReport {
    /// Flag the readings deviating from the mean by more than `sigmas` sample standard
    /// deviations.
    ///
    /// Severity grows with every extra standard deviation past the threshold.
    #[instrument(skip_all, fields(n_readings = readings.len(), sigmas = sigmas))]
    pub fn try_detect(
        readings: &[ConsumptionReading],
        sigmas: f64,
        rate: KilowattHourRate,
    ) -> Result<Self, ValidationError> {
        if !(sigmas.is_finite() && sigmas > 0.0) {
            return Err(ValidationError::NonPositiveSigmas(sigmas));
        }
        if !rate.is_positive() {
            return Err(ValidationError::NonPositiveRate(rate));
        }
        let variance = finite_variance(&consumption_values(readings)?)?;
        let mean = variance.mean();
        let std_dev = sample_std_dev(&variance);
        let margin = sigmas * std_dev;

        let anomalies: Vec<Anomaly> = if std_dev > 0.0 {
            readings
                .iter()
                .filter_map(|reading| Some((reading.timestamp, reading.consumption?)))
                .filter_map(|(timestamp, consumption)| {
                    let deviation = consumption.0 - mean;
                    let anomaly_type = if deviation > margin {
                        AnomalyType::Spike
                    } else if deviation < -margin {
                        AnomalyType::Drop
                    } else {
                        return None;
                    };
                    let z_score = deviation / std_dev;
                    Some(Anomaly {
                        timestamp,
                        consumption,
                        expected: KilowattHours(mean).round_to(2),
                        deviation_percentage: (mean.abs() > f64::EPSILON)
                            .then(|| Percentage(deviation / mean * 100.0).round_to(2)),
                        z_score: crate::quantity::round_to(z_score, 2),
                        anomaly_type,
                        severity: Severity::from_z_score(z_score.abs(), sigmas),
                        cost_impact: (KilowattHours(deviation) * rate).round_to(2),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let summary = AnomalySummary {
            total_anomalies: anomalies.len(),
            high_severity_count: anomalies
                .iter()
                .filter(|anomaly| anomaly.severity == Severity::High)
                .count(),
            estimated_waste: anomalies
                .iter()
                .map(|anomaly| anomaly.cost_impact.max(Cost::ZERO))
                .sum::<Cost>()
                .round_to(2),
        };
        info!(n_anomalies = summary.total_anomalies, n_high = summary.high_severity_count, "done");
        Ok(Self {
            mean: KilowattHours(mean).round_to(2),
            std_dev: KilowattHours(std_dev).round_to(2),
            lower_threshold: KilowattHours(mean - margin).round_to(2),
            upper_threshold: KilowattHours(mean + margin).round_to(2),
            anomalies,
            summary,
        })
    }
}

impl Severity {
    fn from_z_score(z_score: f64, sigmas: f64) -> Self {
        if z_score < sigmas + 1.0 {
            Self::Low
        } else if z_score < sigmas + 2.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta};

    use super::*;

    fn readings(values: &[f64]) -> Vec<ConsumptionReading> {
        let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        values
            .iter()
            .zip(0..)
            .map(|(value, hour)| {
                ConsumptionReading::new(start + TimeDelta::hours(hour), KilowattHours(*value))
            })
            .collect()
    }

    #[test]
    fn test_spike() {
        let mut values = vec![1.0; 47];
        values.insert(10, 8.5);
        let report =
            AnomalyReport::try_detect(&readings(&values), 2.0, KilowattHourRate(0.15)).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        let anomaly = &report.anomalies[0];
        assert_eq!(anomaly.anomaly_type, AnomalyType::Spike);
        assert_eq!(anomaly.consumption, KilowattHours(8.5));
        assert_eq!(
            anomaly.timestamp,
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap().and_hms_opt(10, 0, 0),
        );
        assert_eq!(anomaly.severity, Severity::High);
        assert!(anomaly.cost_impact > Cost::ZERO);
        assert_eq!(report.summary.total_anomalies, 1);
        assert_eq!(report.summary.high_severity_count, 1);
        assert_eq!(report.summary.estimated_waste, anomaly.cost_impact);
    }

    #[test]
    fn test_drop() {
        let mut values = vec![3.0; 30];
        values.push(0.0);
        let report =
            AnomalyReport::try_detect(&readings(&values), 2.0, KilowattHourRate(0.15)).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        let anomaly = &report.anomalies[0];
        assert_eq!(anomaly.anomaly_type, AnomalyType::Drop);
        assert!(anomaly.z_score < 0.0);
        assert!(anomaly.cost_impact < Cost::ZERO);
        assert_abs_diff_eq!(anomaly.deviation_percentage.unwrap().0, -100.0, epsilon = 5.0);
        assert_eq!(report.summary.estimated_waste, Cost::ZERO);
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let report =
            AnomalyReport::try_detect(&readings(&[2.0; 24]), 2.0, KilowattHourRate(0.15)).unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.std_dev, KilowattHours::ZERO);
    }

    #[test]
    fn test_thresholds() {
        let report = AnomalyReport::try_detect(
            &readings(&[1.0, 2.0, 3.0, 4.0, 10.0]),
            1.0,
            KilowattHourRate(0.15),
        )
        .unwrap();
        assert_abs_diff_eq!(report.lower_threshold.0, 0.46);
        assert_abs_diff_eq!(report.upper_threshold.0, 7.54);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].severity, Severity::Low);
    }

    #[test]
    fn test_severity() {
        assert_eq!(Severity::from_z_score(2.5, 2.0), Severity::Low);
        assert_eq!(Severity::from_z_score(3.5, 2.0), Severity::Medium);
        assert_eq!(Severity::from_z_score(4.0, 2.0), Severity::High);
    }

    #[test]
    fn test_invalid_sigmas() {
        assert_eq!(
            AnomalyReport::try_detect(&readings(&[1.0]), 0.0, KilowattHourRate(0.15)),
            Err(ValidationError::NonPositiveSigmas(0.0)),
        );
    }

    #[test]
    fn test_overflowing_values() {
        assert_eq!(
            AnomalyReport::try_detect(&readings(&[1e308, -1e308]), 2.0, KilowattHourRate(0.15)),
            Err(ValidationError::ConsumptionOverflow),
        );
    }

    #[test]
    fn test_no_valid_values() {
        assert_eq!(
            AnomalyReport::try_detect(&[], 2.0, KilowattHourRate(0.15)),
            Err(ValidationError::EmptyReadings),
        );
    }
}
