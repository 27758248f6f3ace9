use std::{cmp::Reverse, collections::BTreeMap};

use derive_more::AddAssign;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    error::ValidationError,
    prelude::*,
    quantity::energy::KilowattHours,
    reading::ConsumptionReading,
};

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PeakHours {
    /// Hours of day, the highest average consumption first.
    pub peak_hours: Vec<u32>,

    /// Average consumption of each peak hour.
    #[serde(rename = "peak_hours_consumption")]
    pub hourly_consumption: BTreeMap<u32, KilowattHours>,

    #[serde(rename = "average_peak_consumption")]
    pub average_peak: KilowattHours,

    /// Number of distinct hours of day present in the readings.
    pub total_hours_analyzed: usize,
}

impl PeakHours {
    /// Rank the hours of day by their average consumption across all the days.
    ///
    /// Hours with equal averages are ordered by the hour itself. Readings lacking either
    /// a timestamp or a consumption value are ignored.
    #[instrument(skip_all, fields(n_readings = readings.len(), top_n = top_n))]
    pub fn try_detect(
        readings: &[ConsumptionReading],
        top_n: usize,
    ) -> Result<Self, ValidationError> {
        if readings.is_empty() {
            return Err(ValidationError::EmptyReadings);
        }
        if top_n == 0 {
            return Err(ValidationError::ZeroTopN);
        }

        let mut hourly = [Accumulator::default(); 24];
        for (hour, consumption) in
            readings.iter().filter_map(|reading| Some((reading.hour()?, reading.consumption?)))
        {
            hourly[hour as usize] += Accumulator { total: consumption, n_readings: 1 };
        }

        let ranked = (0_u32..)
            .zip(hourly)
            .filter_map(|(hour, accumulator)| Some((hour, accumulator.average()?)))
            .sorted_by_key(|(hour, average)| (Reverse(*average), *hour))
            .collect_vec();
        if ranked.is_empty() {
            return Err(ValidationError::NoHourlyConsumption { n_readings: readings.len() });
        }

        let top = &ranked[..top_n.min(ranked.len())];
        #[expect(clippy::cast_precision_loss)]
        let average_peak =
            top.iter().map(|(_, average)| *average).sum::<KilowattHours>() / top.len() as f64;
        if !average_peak.0.is_finite() {
            return Err(ValidationError::ConsumptionOverflow);
        }
        debug!(n_hours = ranked.len(), "done");
        Ok(Self {
            peak_hours: top.iter().map(|(hour, _)| *hour).collect(),
            hourly_consumption: top
                .iter()
                .map(|(hour, average)| (*hour, average.round_to(2)))
                .collect(),
            average_peak: average_peak.round_to(2),
            total_hours_analyzed: ranked.len(),
        })
    }
}

#[derive(Copy, Clone, Default, AddAssign)]
struct Accumulator {
    total: KilowattHours,
    n_readings: u32,
}

impl Accumulator {
    fn average(self) -> Option<KilowattHours> {
        if self.n_readings == 0 { None } else { Some(self.total / f64::from(self.n_readings)) }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta};

    use super::*;

    /// Two days of a typical household profile.
    fn household_readings() -> Vec<ConsumptionReading> {
        let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        (0..48)
            .map(|hour| {
                let consumption = match hour % 24 {
                    0..6 => 0.8,
                    6..9 => 2.5,
                    9..17 => 1.5,
                    17..22 if hour % 2 == 1 => 3.4,
                    17..22 => 3.0,
                    _ => 1.2,
                };
                ConsumptionReading::new(
                    start + TimeDelta::hours(hour),
                    KilowattHours(consumption),
                )
            })
            .collect()
    }

    #[test]
    fn test_detect() {
        let peaks = PeakHours::try_detect(&household_readings(), 5).unwrap();
        // Odd evening hours are more loaded on both days:
        assert_eq!(peaks.peak_hours, [17, 19, 21, 18, 20]);
        assert_eq!(peaks.hourly_consumption[&17], KilowattHours(3.4));
        assert_eq!(peaks.hourly_consumption[&18], KilowattHours(3.0));
        assert_abs_diff_eq!(peaks.average_peak.0, 3.24);
        assert_eq!(peaks.total_hours_analyzed, 24);
    }

    #[test]
    fn test_average_per_hour() {
        let readings = [
            ConsumptionReading::parse(Some("2024-11-01T23:00:00"), Some("10")),
            ConsumptionReading::parse(Some("2024-11-02T23:30:00"), Some("2")),
            ConsumptionReading::parse(Some("2024-11-02T07:00:00"), Some("1")),
        ];
        let peaks = PeakHours::try_detect(&readings, 5).unwrap();
        assert_eq!(peaks.peak_hours, [23, 7]);
        assert_eq!(peaks.hourly_consumption[&23], KilowattHours(6.0));
        assert_eq!(peaks.total_hours_analyzed, 2);
        assert_abs_diff_eq!(peaks.average_peak.0, 3.5);
    }

    #[test]
    fn test_ties_are_broken_by_hour() {
        let readings = [
            ConsumptionReading::parse(Some("2024-11-01T20:00:00"), Some("1.0")),
            ConsumptionReading::parse(Some("2024-11-01T03:00:00"), Some("1.0")),
            ConsumptionReading::parse(Some("2024-11-01T11:00:00"), Some("1.0")),
        ];
        assert_eq!(PeakHours::try_detect(&readings, 2).unwrap().peak_hours, [3, 11]);
    }

    #[test]
    fn test_idempotent() {
        let readings = household_readings();
        assert_eq!(PeakHours::try_detect(&readings, 5), PeakHours::try_detect(&readings, 5));
    }

    #[test]
    fn test_overflowing_hour() {
        let readings = [
            ConsumptionReading::parse(Some("2024-11-01T20:00:00"), Some("1e308")),
            ConsumptionReading::parse(Some("2024-11-02T20:00:00"), Some("1e308")),
        ];
        assert_eq!(
            PeakHours::try_detect(&readings, 1),
            Err(ValidationError::ConsumptionOverflow),
        );
    }

    #[test]
    fn test_top_n_limits_hours() {
        let peaks = PeakHours::try_detect(&household_readings(), 3).unwrap();
        assert_eq!(peaks.peak_hours.len(), 3);
        assert_eq!(peaks.hourly_consumption.len(), 3);
    }

    #[test]
    fn test_skips_malformed_readings() {
        let readings = [
            ConsumptionReading::parse(Some("not a date"), Some("100")),
            ConsumptionReading::parse(Some("2024-11-01T05:00:00"), Some("oops")),
            ConsumptionReading::parse(Some("2024-11-01T06:00:00"), Some("0.5")),
        ];
        let peaks = PeakHours::try_detect(&readings, 5).unwrap();
        assert_eq!(peaks.peak_hours, [6]);
    }

    #[test]
    fn test_no_hours() {
        let readings = [ConsumptionReading::parse(Some("not a date"), Some("1.0"))];
        assert_eq!(
            PeakHours::try_detect(&readings, 5),
            Err(ValidationError::NoHourlyConsumption { n_readings: 1 }),
        );
    }

    #[test]
    fn test_zero_top_n() {
        assert_eq!(
            PeakHours::try_detect(&household_readings(), 0),
            Err(ValidationError::ZeroTopN),
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(PeakHours::try_detect(&[], 5), Err(ValidationError::EmptyReadings));
    }
}
