use serde::Serialize;

use crate::{
    error::ValidationError,
    quantity::{cost::Cost, energy::KilowattHours, percentage::Percentage, rate::KilowattHourRate},
};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Projected effect of a hypothetical consumption reduction.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Savings {
    #[serde(rename = "monthly_savings_usd")]
    pub monthly_savings: Cost,

    #[serde(rename = "annual_savings_usd")]
    pub annual_savings: Cost,

    #[serde(rename = "kwh_saved_monthly")]
    pub monthly_energy_saved: KilowattHours,

    #[serde(rename = "kwh_saved_annually")]
    pub annual_energy_saved: KilowattHours,

    pub current_monthly_cost: Cost,
    pub new_monthly_cost: Cost,

    /// Passed through as is.
    pub reduction_percentage: Percentage,
}

pub fn estimate_savings(
    current_monthly_consumption: KilowattHours,
    reduction: Percentage,
    rate: KilowattHourRate,
) -> Result<Savings, ValidationError> {
    if !current_monthly_consumption.is_positive() {
        return Err(ValidationError::NonPositiveConsumption(current_monthly_consumption));
    }
    if !(0.0..=100.0).contains(&reduction.0) {
        return Err(ValidationError::ReductionOutOfRange(reduction));
    }
    if !rate.is_positive() {
        return Err(ValidationError::NonPositiveRate(rate));
    }

    let monthly_energy_saved = current_monthly_consumption * reduction;
    let monthly_savings = monthly_energy_saved * rate;
    let current_monthly_cost = current_monthly_consumption * rate;
    let annual_savings = monthly_savings * MONTHS_PER_YEAR;
    let annual_energy_saved = monthly_energy_saved * MONTHS_PER_YEAR;
    if !(current_monthly_cost.0.is_finite()
        && annual_savings.0.is_finite()
        && annual_energy_saved.0.is_finite())
    {
        return Err(ValidationError::ConsumptionOverflow);
    }
    Ok(Savings {
        monthly_savings: monthly_savings.round_to(2),
        annual_savings: annual_savings.round_to(2),
        monthly_energy_saved: monthly_energy_saved.round_to(2),
        annual_energy_saved: annual_energy_saved.round_to(2),
        current_monthly_cost: current_monthly_cost.round_to(2),
        new_monthly_cost: (current_monthly_cost - monthly_savings).round_to(2),
        reduction_percentage: reduction,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_estimate() {
        let savings =
            estimate_savings(KilowattHours(850.0), Percentage(15.0), KilowattHourRate(0.15))
                .unwrap();
        assert_abs_diff_eq!(savings.monthly_energy_saved.0, 127.5);
        assert_abs_diff_eq!(savings.annual_energy_saved.0, 1530.0);
        assert_abs_diff_eq!(savings.monthly_savings.0, 19.13);
        assert_abs_diff_eq!(savings.annual_savings.0, 229.5);
        assert_abs_diff_eq!(savings.current_monthly_cost.0, 127.5);
        assert_abs_diff_eq!(savings.new_monthly_cost.0, 108.38);
        assert_eq!(savings.reduction_percentage, Percentage(15.0));
    }

    #[test]
    fn test_idempotent() {
        let estimate =
            || estimate_savings(KilowattHours(850.0), Percentage(15.0), KilowattHourRate(0.15));
        assert_eq!(estimate(), estimate());
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            estimate_savings(KilowattHours(f64::MAX), Percentage(50.0), KilowattHourRate(10.0)),
            Err(ValidationError::ConsumptionOverflow),
        );
    }

    #[test]
    fn test_zero_reduction() {
        let savings =
            estimate_savings(KilowattHours(500.0), Percentage(0.0), KilowattHourRate(0.2)).unwrap();
        assert_eq!(savings.monthly_savings, Cost::ZERO);
        assert_eq!(savings.new_monthly_cost, savings.current_monthly_cost);
    }

    #[test]
    fn test_full_reduction() {
        let savings =
            estimate_savings(KilowattHours(500.0), Percentage(100.0), KilowattHourRate(0.2))
                .unwrap();
        assert_eq!(savings.new_monthly_cost, Cost::ZERO);
    }

    #[test]
    fn test_reduction_out_of_range() {
        assert_eq!(
            estimate_savings(KilowattHours(850.0), Percentage(100.5), KilowattHourRate(0.15)),
            Err(ValidationError::ReductionOutOfRange(Percentage(100.5))),
        );
        assert!(
            estimate_savings(KilowattHours(850.0), Percentage(-1.0), KilowattHourRate(0.15))
                .is_err()
        );
        assert!(
            estimate_savings(KilowattHours(850.0), Percentage(f64::NAN), KilowattHourRate(0.15))
                .is_err()
        );
    }

    #[test]
    fn test_non_positive_consumption() {
        assert_eq!(
            estimate_savings(KilowattHours(0.0), Percentage(10.0), KilowattHourRate(0.15)),
            Err(ValidationError::NonPositiveConsumption(KilowattHours(0.0))),
        );
    }

    #[test]
    fn test_non_positive_rate() {
        assert_eq!(
            estimate_savings(KilowattHours(850.0), Percentage(10.0), KilowattHourRate(-0.15)),
            Err(ValidationError::NonPositiveRate(KilowattHourRate(-0.15))),
        );
    }
}
