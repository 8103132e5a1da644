//! Exact-decimal money helpers
//!
//! Balances, amounts and fees are `rust_decimal::Decimal` everywhere inside
//! the core. Binary floats only appear in transport representations and are
//! converted here, once, at the boundary.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{WalletError, WalletResult};

/// Currency minor-unit precision (cents)
pub const MONEY_DECIMALS: u32 = 2;

/// Round to currency precision, half-up (away from zero at the midpoint).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Reject zero and negative amounts.
pub fn ensure_positive(amount: Decimal) -> WalletResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount);
    }
    Ok(amount)
}

/// Convert a transport float into an exact amount at currency precision.
///
/// Non-finite inputs are rejected as `InvalidAmount`.
pub fn from_transport(value: f64) -> WalletResult<Decimal> {
    let decimal = Decimal::from_f64(value).ok_or(WalletError::InvalidAmount)?;
    Ok(round_money(decimal))
}

/// Convert an exact amount to a transport float (lossy, presentation only).
pub fn to_transport(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Amount in integer minor units (cents), as payment gateways expect.
pub fn to_minor_units(value: Decimal) -> WalletResult<i64> {
    let scaled = round_money(value) * Decimal::ONE_HUNDRED;
    scaled.to_i64().ok_or(WalletError::InvalidAmount)
}

/// Inverse of [`to_minor_units`].
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, MONEY_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_transport_float_becomes_exact() {
        // 0.1 + 0.2 is not 0.3 in binary floating point
        let amount = from_transport(0.1 + 0.2).unwrap();
        assert_eq!(amount, dec!(0.30));
        assert!(from_transport(f64::NAN).is_err());
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec!(30.00)).unwrap(), 3000);
        assert_eq!(to_minor_units(dec!(12.345)).unwrap(), 1235);
        assert_eq!(from_minor_units(2880), dec!(28.80));
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive(dec!(0.01)).is_ok());
        assert!(matches!(ensure_positive(Decimal::ZERO), Err(WalletError::InvalidAmount)));
        assert!(matches!(ensure_positive(dec!(-5)), Err(WalletError::InvalidAmount)));
    }
}
