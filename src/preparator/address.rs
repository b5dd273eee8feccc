// ABOUTME: SMPP addresses (TON, NPI, value) and translation of phone number strings into them
// ABOUTME: The default translator recognises international, national, short code and alphanumeric senders

use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
    pub value: String,
}

impl Address {
    pub fn new(ton: TypeOfNumber, npi: NumericPlanIndicator, value: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            value: value.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("phone number is empty")]
    Empty,

    #[error("phone number {0:?} is not a valid address")]
    Invalid(String),
}

pub trait AddressTranslator: Send + Sync {
    fn translate(&self, number: &str) -> Result<Address, AddressError>;
}

/// Longest all-digit number treated as a short code
pub const MAX_SHORT_CODE_LENGTH: usize = 6;

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAddressTranslator;

impl AddressTranslator for DefaultAddressTranslator {
    fn translate(&self, number: &str) -> Result<Address, AddressError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Some(digits) = number.strip_prefix('+') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return Ok(Address::new(
                    TypeOfNumber::International,
                    NumericPlanIndicator::Isdn,
                    digits,
                ));
            }
            return Err(AddressError::Invalid(number.to_string()));
        }

        if number.chars().all(|c| c.is_ascii_digit()) {
            let ton = if number.len() <= MAX_SHORT_CODE_LENGTH {
                TypeOfNumber::Unknown
            } else {
                TypeOfNumber::National
            };
            return Ok(Address::new(ton, NumericPlanIndicator::Isdn, number));
        }

        if number.chars().any(char::is_alphabetic) {
            return Ok(Address::new(
                TypeOfNumber::Alphanumeric,
                NumericPlanIndicator::Unknown,
                number,
            ));
        }

        Err(AddressError::Invalid(number.to_string()))
    }
}
