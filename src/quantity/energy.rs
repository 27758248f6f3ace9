use std::ops::Mul;

use crate::quantity::{percentage::Percentage, rate::KilowattHourRate};

quantity!(KilowattHours, suffix: "kWh", precision: 2);

implement_mul!(KilowattHours, KilowattHourRate, crate::quantity::cost::Cost);

impl Mul<Percentage> for KilowattHours {
    type Output = Self;

    fn mul(self, percentage: Percentage) -> Self::Output {
        self * percentage.to_ratio()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_mul_rate() {
        assert_abs_diff_eq!((KilowattHours(850.0) * KilowattHourRate(0.15)).0, 127.5);
    }

    #[test]
    fn test_mul_percentage() {
        assert_abs_diff_eq!((KilowattHours(850.0) * Percentage(15.0)).0, 127.5);
    }
}
