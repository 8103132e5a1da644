//! Platform fee arithmetic
//!
//! Fees apply to withdrawals only. The fee is rounded half-up to cents and
//! the net amount is whatever remains, so the two always add back up to
//! the gross amount.

use carewallet_types::{round_money, WalletError, WalletResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 4%
pub const DEFAULT_PLATFORM_FEE: Decimal = dec!(0.04);

/// Fee split of a gross amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub fee: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct FeeCalculator {
    percentage: Decimal,
}

impl FeeCalculator {
    /// Percentage must lie in `[0, 1)`
    pub fn new(percentage: Decimal) -> WalletResult<Self> {
        if percentage < Decimal::ZERO || percentage >= Decimal::ONE {
            return Err(WalletError::Config(format!(
                "Platform fee percentage must be in [0, 1), got {}",
                percentage
            )));
        }
        Ok(Self { percentage })
    }

    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    pub fn compute(&self, amount: Decimal) -> FeeBreakdown {
        let fee = round_money(amount * self.percentage);
        FeeBreakdown {
            fee,
            net: amount - fee,
        }
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self {
            percentage: DEFAULT_PLATFORM_FEE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fee_on_thirty() {
        let split = FeeCalculator::default().compute(dec!(30.00));
        assert_eq!(split.fee, dec!(1.20));
        assert_eq!(split.net, dec!(28.80));
    }

    #[test]
    fn test_fee_rounds_half_up() {
        // 4% of 0.125 = 0.005 -> 0.01
        let split = FeeCalculator::default().compute(dec!(0.125));
        assert_eq!(split.fee, dec!(0.01));
        assert_eq!(split.net, dec!(0.115));
    }

    #[test]
    fn test_fee_plus_net_is_exact() {
        let calc = FeeCalculator::new(dec!(0.035)).unwrap();
        for amount in [dec!(0.01), dec!(1.99), dec!(33.33), dec!(1234.56), dec!(99999.99)] {
            let split = calc.compute(amount);
            assert_eq!(split.fee + split.net, amount);
            assert!(split.fee >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_zero_fee() {
        let split = FeeCalculator::new(Decimal::ZERO).unwrap().compute(dec!(50));
        assert_eq!(split.fee, Decimal::ZERO);
        assert_eq!(split.net, dec!(50));
    }

    #[test]
    fn test_percentage_validated() {
        assert!(matches!(FeeCalculator::new(dec!(-0.01)), Err(WalletError::Config(_))));
        assert!(matches!(FeeCalculator::new(Decimal::ONE), Err(WalletError::Config(_))));
        assert!(FeeCalculator::new(dec!(0.99)).is_ok());
    }
}
