//! Token amounts in minor units.
//!
//! All arithmetic is integer-only. The decimals value configured on the
//! mint is passed explicitly wherever whole tokens are scaled to minor
//! units, so the scale factor has a single definition shared by supply
//! planning and distribution.

use crate::error::{LedgerError, Result};
use crate::MAX_DECIMALS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of tokens, stored in minor units (base units).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Amount {
    base_units: u64,
}

impl Amount {
    /// Zero tokens.
    pub const ZERO: Self = Self { base_units: 0 };

    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_base_units(base_units: u64) -> Self {
        Self { base_units }
    }

    /// The minor-units-per-whole-token scale factor for a decimals value.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if `decimals` exceeds
    /// [`MAX_DECIMALS`].
    pub fn scale_factor(decimals: u8) -> Result<u64> {
        if decimals > MAX_DECIMALS {
            return Err(LedgerError::configuration(format!(
                "decimals must be at most {MAX_DECIMALS}, got {decimals}"
            )));
        }
        Ok(10u64.pow(u32::from(decimals)))
    }

    /// Create an amount from a whole-token count scaled by `decimals`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if decimals is out of range
    /// or the scaled value overflows `u64`.
    pub fn from_whole(whole: u64, decimals: u8) -> Result<Self> {
        let scale = Self::scale_factor(decimals)?;
        let base_units = whole.checked_mul(scale).ok_or_else(|| {
            LedgerError::configuration(format!(
                "{whole} whole tokens at {decimals} decimals overflows"
            ))
        })?;
        Ok(Self { base_units })
    }

    /// Exactly one whole token at the given decimals.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if decimals is out of range.
    pub fn one(decimals: u8) -> Result<Self> {
        Self::from_whole(1, decimals)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn base_units(&self) -> u64 {
        self.base_units
    }

    /// Get the whole-token count (truncating any fractional remainder).
    #[must_use]
    pub fn whole(&self, decimals: u8) -> u64 {
        match Self::scale_factor(decimals) {
            Ok(scale) => self.base_units / scale,
            Err(_) => 0,
        }
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.base_units == 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.base_units.checked_add(other.base_units) {
            Some(base_units) => Some(Self { base_units }),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.base_units.checked_sub(other.base_units) {
            Some(base_units) => Some(Self { base_units }),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self {
            base_units: self.base_units.saturating_add(other.base_units),
        }
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self {
            base_units: self.base_units.saturating_sub(other.base_units),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} base units", self.base_units)
    }
}

impl From<u64> for Amount {
    fn from(base_units: u64) -> Self {
        Self::from_base_units(base_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => 1)]
    #[test_case(2 => 100)]
    #[test_case(9 => 1_000_000_000)]
    fn scale_factors(decimals: u8) -> u64 {
        Amount::scale_factor(decimals).expect("valid decimals")
    }

    #[test]
    fn decimals_out_of_range_rejected() {
        let result = Amount::scale_factor(MAX_DECIMALS + 1);
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::Configuration { .. }
        ));
    }

    #[test]
    fn whole_token_scaling() {
        let amount = Amount::from_whole(3, 2).expect("should scale");
        assert_eq!(amount.base_units(), 300);
        assert_eq!(amount.whole(2), 3);
    }

    #[test]
    fn one_unit_at_two_decimals() {
        let one = Amount::one(2).expect("should scale");
        assert_eq!(one.base_units(), 100);
    }

    #[test]
    fn overflow_is_rejected() {
        let result = Amount::from_whole(u64::MAX, 2);
        assert!(result.is_err());
    }

    #[test]
    fn zero() {
        assert!(Amount::ZERO.is_zero());
        assert_eq!(Amount::default(), Amount::ZERO);
    }

    #[test]
    fn checked_arithmetic() {
        let a = Amount::from_base_units(100);
        let b = Amount::from_base_units(30);
        assert_eq!(a.checked_add(b), Some(Amount::from_base_units(130)));
        assert_eq!(a.checked_sub(b), Some(Amount::from_base_units(70)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::from_base_units(u64::MAX).checked_add(b), None);
    }

    #[test]
    fn saturating_arithmetic() {
        let a = Amount::from_base_units(10);
        let b = Amount::from_base_units(30);
        assert!(a.saturating_sub(b).is_zero());
        assert_eq!(
            Amount::from_base_units(u64::MAX).saturating_add(a),
            Amount::from_base_units(u64::MAX)
        );
    }

    #[test]
    fn ordering() {
        assert!(Amount::from_base_units(1) < Amount::from_base_units(2));
    }

    #[test]
    fn serde_roundtrip() {
        let amount = Amount::from_base_units(250);
        let json = serde_json::to_string(&amount).expect("serialize");
        let parsed: Amount = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(amount, parsed);
    }
}
