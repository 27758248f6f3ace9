#[macro_use]
mod macros;

pub mod cost;
pub mod currency;
pub mod energy;
pub mod percentage;
pub mod rate;

/// Round half away from zero to the specified number of decimal places.
///
/// Values too large to scale are already whole and are returned as is.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    let scaled = value * factor;
    if scaled.is_finite() { scaled.round() / factor } else { value }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::quantity::{energy::KilowattHours, rate::KilowattHourRate};

    #[test]
    fn test_round_half_away_from_zero() {
        assert_abs_diff_eq!(round_to(19.125, 2), 19.13);
        assert_abs_diff_eq!(round_to(-19.125, 2), -19.13);
        assert_abs_diff_eq!(round_to(0.1234, 3), 0.123);
    }

    #[test]
    fn test_round_huge_value_stays_finite() {
        assert_eq!(round_to(1e308, 2), 1e308);
        assert_eq!(round_to(-1e308, 3), -1e308);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_is_positive() {
        assert!(KilowattHours(0.1).is_positive());
        assert!(!KilowattHours(0.0).is_positive());
        assert!(!KilowattHourRate(-0.1).is_positive());
        assert!(!KilowattHourRate(f64::NAN).is_positive());
        assert!(!KilowattHourRate(f64::INFINITY).is_positive());
    }

    #[test]
    fn test_ordering() {
        assert!(KilowattHours(1.0) < KilowattHours(2.0));
        assert_eq!(KilowattHours(1.0).min(KilowattHours(2.0)), KilowattHours(1.0));
        assert_eq!(KilowattHours(1.0).max(KilowattHours(2.0)), KilowattHours(2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(KilowattHours(127.5).to_string(), "127.50 kWh");
        assert_eq!(KilowattHourRate(0.15).to_string(), "0.150 /kWh");
    }
}
