//! DTOs for decoding Stripe responses.

use serde::Deserialize;

use crate::domain::Amount;
use crate::domain::ports::PaymentIntent;

#[derive(Debug, Deserialize)]
pub(super) struct PaymentIntentDto {
    pub(super) client_secret: Option<String>,
    pub(super) amount: u64,
    pub(super) currency: String,
}

impl PaymentIntentDto {
    pub(super) fn into_domain(self) -> Result<PaymentIntent, String> {
        let client_secret = self
            .client_secret
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| "payment intent response missing client_secret".to_owned())?;
        Ok(PaymentIntent {
            client_secret,
            amount: Amount::from_cents(self.amount),
            currency: self.currency,
        })
    }
}

/// Stripe wraps failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDto {
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
}
