//! Monetary rounding helpers.
//!
//! Sums keep full `f64` precision internally; these helpers are applied
//! only where a value crosses the presentation boundary. Responses carry
//! plain numbers, never currency symbols.

/// Round to one decimal place (used for percentages).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (used for monetary amounts).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round1, round2};

    #[test]
    fn round1_rounds_percentages() {
        assert_eq!(round1(84.0), 84.0);
        assert_eq!(round1(83.96), 84.0);
        assert_eq!(round1(33.333333), 33.3);
    }

    #[test]
    fn round2_rounds_amounts() {
        assert_eq!(round2(0.1 + 0.2), 0.3);
        assert_eq!(round2(1234.567), 1234.57);
        assert_eq!(round2(40.0), 40.0);
    }
}
