use crate::error::PortalError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative price with cent precision.
///
/// Wraps `rust_decimal::Decimal` so prices never go negative and always
/// convert cleanly to the minor units the payment gateway expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price or total.
    pub const MAX: Decimal = dec!(1000000.00);

    pub fn new(value: Decimal) -> Result<Self, PortalError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PortalError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }
        if value.scale() > 2 && value.round_dp(2) != value {
            return Err(PortalError::ValidationError(
                "Price must not have more than two decimal places".to_string(),
            ));
        }
        if value > Self::MAX {
            return Err(out_of_range());
        }
        Ok(Self(value.round_dp(2)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_free(&self) -> bool {
        self.0.is_zero()
    }

    /// Price of `quantity` units.
    pub fn times(&self, quantity: u32) -> Result<Self, PortalError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .filter(|total| *total <= Self::MAX)
            .map(Self)
            .ok_or_else(out_of_range)
    }

    /// Amount in cents.
    pub fn to_minor_units(&self) -> Result<i64, PortalError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.round().to_i64())
            .ok_or_else(out_of_range)
    }
}

fn out_of_range() -> PortalError {
    PortalError::ValidationError("Price is out of range".to_string())
}

impl TryFrom<Decimal> for Price {
    type Error = PortalError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
