//! Driven port for the external payment provider.
//!
//! Only intent creation is modelled. Confirmation happens client side and is
//! trusted when the client presents a [`PaymentProof`](crate::domain::PaymentProof).

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Amount;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The provider could not be reached.
        Connection { message: String } => "payment provider unreachable: {message}",
        /// The provider refused the request.
        Rejected { message: String } => "payment provider rejected the request: {message}",
    }
}

/// A created payment intent. The client secret is handed to the browser to
/// confirm the charge with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Secret the browser uses to confirm the charge.
    pub client_secret: String,
    /// Amount to charge, in cents.
    #[schema(value_type = u64)]
    pub amount: Amount,
    /// ISO currency code, lower case.
    pub currency: String,
}

/// Payment provider that creates card payment intents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a card payment intent for `amount` in `currency`.
    async fn create_payment_intent(
        &self,
        amount: Amount,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentGatewayError>;
}

/// Offline gateway used when no provider key is configured.
///
/// Produces secrets shaped like Stripe's (`pi_<id>_secret_<id>`) so clients
/// can exercise the flow locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: Amount,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        let intent = Uuid::new_v4().simple();
        let secret = Uuid::new_v4().simple();
        Ok(PaymentIntent {
            client_secret: format!("pi_{intent}_secret_{secret}"),
            amount,
            currency: currency.to_owned(),
        })
    }
}
