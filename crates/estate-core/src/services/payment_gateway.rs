//! Simulated payment gateway. Validates the payment details and always
//! succeeds; no money moves.

use tracing::info;
use uuid::Uuid;

use crate::domain::{PaymentDetails, Receipt};
use crate::error::DomainError;

#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
    currency: String,
}

impl MockPaymentGateway {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn charge(&self, details: &PaymentDetails, amount: i64) -> Result<Receipt, DomainError> {
        if amount < 0 {
            return Err(DomainError::invalid("Amount cannot be negative"));
        }
        details.validate()?;

        let reference = format!("PAY-{}", Uuid::new_v4().simple().to_string().to_uppercase());
        info!(
            method = details.label(),
            amount,
            currency = %self.currency,
            reference = %reference,
            "Mock payment accepted"
        );
        Ok(Receipt {
            reference,
            method: details.label().to_string(),
            amount,
            currency: self.currency.clone(),
            paid_at: estate_shared::now_millis(),
        })
    }
}
