//! Numeric helpers shared by the scoring and synthesis stages

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round a non-negative amount to whole currency units
pub fn to_units(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round1_half_up() {
        assert_eq!(round1(2.73), 2.7);
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn to_units_clamps_negative_and_nan() {
        assert_eq!(to_units(-5.0), 0);
        assert_eq!(to_units(f64::NAN), 0);
        assert_eq!(to_units(39_999.6), 40_000);
    }
}
