//! Parsing, validation, and rounding for monetary amounts.

use crate::Error;

/// The number of decimal places amounts are rounded to before storage.
pub const AMOUNT_DECIMAL_PLACES: i32 = 2;

/// Round an amount to the canonical decimal precision.
///
/// The rounding mode is half-up: `f64::round` rounds halfway cases away
/// from zero, and amounts in this application are always positive.
pub fn round_amount(amount: f64) -> f64 {
    let scale = 10f64.powi(AMOUNT_DECIMAL_PLACES);

    (amount * scale).round() / scale
}

/// Parse a user-entered amount string into a rounded, positive amount.
///
/// # Errors
/// Returns an [Error::InvalidAmount] if `input` is blank, not a decimal
/// number, not finite, or not greater than zero.
pub fn parse_amount(input: &str) -> Result<f64, Error> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAmount(input.to_string()))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(input.to_string()));
    }

    Ok(round_amount(amount))
}

#[cfg(test)]
mod round_amount_tests {
    use super::round_amount;

    #[test]
    fn rounds_half_up_to_two_decimal_places() {
        assert_eq!(round_amount(12.3456), 12.35);
        assert_eq!(round_amount(12.344), 12.34);
        assert_eq!(round_amount(0.005), 0.01);
    }

    #[test]
    fn leaves_exact_amounts_unchanged() {
        assert_eq!(round_amount(100.0), 100.0);
        assert_eq!(round_amount(0.25), 0.25);
    }
}
