//! Percentage <-> fraction conversion.
//!
//! Campaign records carry rates the way users type them (`2.5` means 2.5%).
//! All arithmetic in the engine works on fractions. Conversions go through
//! [`Rate`] only, so a value is never scaled twice.

/// A ratio held as a fraction (`0.025` for 2.5%).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Rate(f64);

impl Rate {
    pub const ZERO: Rate = Rate(0.0);

    /// From the 0-100 representation. Non-finite or negative input is zero.
    pub fn from_percent(percent: f64) -> Self {
        Self(sanitize(percent) / 100.0)
    }

    /// `part / whole`, zero when `whole` is zero.
    pub fn ratio(part: f64, whole: f64) -> Self {
        Self(safe_div(sanitize(part), whole))
    }

    pub fn fraction(self) -> f64 {
        self.0
    }

    /// Back to the 0-100 representation.
    pub fn as_percent(self) -> f64 {
        self.0 * 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }

    /// Apply the rate to a base quantity.
    pub fn of(self, base: f64) -> f64 {
        base * self.0
    }
}

/// `numerator / denominator`, or zero when the denominator is not positive
/// or the result is not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        finite_or_zero(numerator / denominator)
    } else {
        0.0
    }
}

/// Zero for NaN, infinities and negative values.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_round_trip() {
        let rate = Rate::from_percent(2.5);
        assert!((rate.fraction() - 0.025).abs() < 1e-12);
        assert!((rate.as_percent() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_percent_is_zero() {
        assert_eq!(Rate::from_percent(f64::NAN), Rate::ZERO);
        assert_eq!(Rate::from_percent(-3.0), Rate::ZERO);
        assert_eq!(Rate::from_percent(f64::INFINITY), Rate::ZERO);
        assert!(!Rate::from_percent(0.0).is_positive());
    }

    #[test]
    fn test_ratio_guards_zero_whole() {
        assert_eq!(Rate::ratio(10.0, 0.0), Rate::ZERO);
        assert!((Rate::ratio(25.0, 100.0).as_percent() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_of_applies_fraction() {
        assert!((Rate::from_percent(10.0).of(500.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(5.0, -1.0), 0.0);
        assert_eq!(safe_div(f64::MAX, f64::MIN_POSITIVE), 0.0);
        assert!((safe_div(10.0, 4.0) - 2.5).abs() < f64::EPSILON);
    }
}
