// ============================================================================
// Estate Core - Payment Details
// File: crates/estate-core/src/domain/payment.rs
// Description: Payment method payloads and receipts for the mock gateway
// ============================================================================

use std::fmt;

use estate_shared::Timestamp;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 ]{7,15}$";
const CARD_NUMBER_PATTERN: &str = r"^[0-9]{12,19}$";
const EXPIRY_PATTERN: &str = r"^(0[1-9]|1[0-2])/[0-9]{2}$";
const CVV_PATTERN: &str = r"^[0-9]{3,4}$";

fn matches_pattern(pattern: &str, value: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

/// Payment method with the details it requires.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentDetails {
    #[serde(rename_all = "camelCase")]
    Mtn { phone_number: String },
    #[serde(rename_all = "camelCase")]
    Orange { phone_number: String },
    #[serde(rename_all = "camelCase")]
    Card {
        card_number: String,
        card_name: String,
        expiry_date: String,
        cvv: String,
    },
}

// Card data never reaches logs.
impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails").field("method", &self.label()).finish_non_exhaustive()
    }
}

impl PaymentDetails {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentDetails::Mtn { .. } => "MTN Mobile Money",
            PaymentDetails::Orange { .. } => "Orange Money",
            PaymentDetails::Card { .. } => "Card",
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            PaymentDetails::Mtn { phone_number } | PaymentDetails::Orange { phone_number } => {
                if !matches_pattern(PHONE_PATTERN, phone_number.trim()) {
                    return Err(DomainError::invalid("A valid phone number is required for mobile money"));
                }
            }
            PaymentDetails::Card {
                card_number,
                card_name,
                expiry_date,
                cvv,
            } => {
                let digits: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
                if !matches_pattern(CARD_NUMBER_PATTERN, &digits) {
                    return Err(DomainError::invalid("Card number is invalid"));
                }
                if card_name.trim().is_empty() {
                    return Err(DomainError::invalid("Cardholder name is required"));
                }
                if !matches_pattern(EXPIRY_PATTERN, expiry_date.trim()) {
                    return Err(DomainError::invalid("Expiry date must be MM/YY"));
                }
                if !matches_pattern(CVV_PATTERN, cvv.trim()) {
                    return Err(DomainError::invalid("CVV is invalid"));
                }
            }
        }
        Ok(())
    }
}

/// Proof of a (simulated) successful charge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub reference: String,
    pub method: String,
    pub amount: i64,
    pub currency: String,
    pub paid_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str) -> PaymentDetails {
        PaymentDetails::Card {
            card_number: number.into(),
            card_name: "Ann N".into(),
            expiry_date: expiry.into(),
            cvv: "123".into(),
        }
    }

    #[test]
    fn deserializes_tagged_method() {
        let p: PaymentDetails =
            serde_json::from_value(serde_json::json!({"method": "mtn", "phoneNumber": "677123456"})).unwrap();
        assert_eq!(p.label(), "MTN Mobile Money");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_missing_mobile_number() {
        let p = PaymentDetails::Orange { phone_number: " ".into() };
        assert!(matches!(p.validate(), Err(DomainError::ValidationFailed(_))));
    }

    #[test]
    fn validates_card_fields() {
        assert!(card("4111 1111 1111 1111", "12/29").validate().is_ok());
        assert!(card("4111", "12/29").validate().is_err());
        assert!(card("4111111111111111", "13/29").validate().is_err());
    }

    #[test]
    fn debug_hides_card_data() {
        let rendered = format!("{:?}", card("4111111111111111", "12/29"));
        assert!(!rendered.contains("4111"));
    }
}
