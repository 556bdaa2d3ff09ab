//! Reqwest-backed Stripe payment intent adapter.
//!
//! This adapter owns transport details only: form encoding, bearer
//! authentication, timeout and HTTP error mapping, and JSON decoding into
//! [`PaymentIntent`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{ErrorEnvelopeDto, PaymentIntentDto};
use crate::domain::Amount;
use crate::domain::ports::{PaymentGateway, PaymentGatewayError, PaymentIntent};

/// Production Stripe API root.
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

const PAYMENT_INTENTS_PATH: &str = "v1/payment_intents";

/// Payment gateway that creates card payment intents through Stripe.
pub struct StripePaymentGateway {
    client: Client,
    endpoint: Url,
    secret_key: Zeroizing<String>,
}

impl StripePaymentGateway {
    /// Build an adapter posting to `{api_base}/v1/payment_intents`.
    ///
    /// # Errors
    ///
    /// Returns an error message when the base URL cannot be joined or the
    /// reqwest client cannot be constructed.
    pub fn new(
        api_base: &Url,
        secret_key: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, String> {
        let endpoint = payment_intents_endpoint(api_base)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| format!("failed to build payment client: {err}"))?;
        Ok(Self {
            client,
            endpoint,
            secret_key,
        })
    }
}

fn payment_intents_endpoint(api_base: &Url) -> Result<Url, String> {
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(PAYMENT_INTENTS_PATH)
        .map_err(|err| format!("invalid payment API base {api_base}: {err}"))
}

fn intent_form(amount: Amount, currency: &str) -> [(&'static str, String); 3] {
    [
        ("amount", amount.cents().to_string()),
        ("currency", currency.to_ascii_lowercase()),
        ("payment_method_types[]", "card".to_owned()),
    ]
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: Amount,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.secret_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&intent_form(amount, currency))
            .send()
            .await
            .map_err(|err| PaymentGatewayError::connection(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::connection(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_intent(body.as_ref())
    }
}

fn parse_intent(body: &[u8]) -> Result<PaymentIntent, PaymentGatewayError> {
    let decoded: PaymentIntentDto = serde_json::from_slice(body).map_err(|err| {
        PaymentGatewayError::rejected(format!("invalid payment intent payload: {err}"))
    })?;
    decoded.into_domain().map_err(PaymentGatewayError::rejected)
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let detail = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .map(|envelope| envelope.error);
    debug!(
        status = status.as_u16(),
        kind = detail.as_ref().and_then(|d| d.kind.as_deref()),
        "payment provider returned an error"
    );
    let message = match detail.and_then(|d| d.message) {
        Some(text) => format!("status {}: {text}", status.as_u16()),
        None => format!("status {}", status.as_u16()),
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            PaymentGatewayError::connection(message)
        }
        _ if status.is_client_error() => PaymentGatewayError::rejected(message),
        _ => PaymentGatewayError::connection(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare_host("https://api.stripe.com", "https://api.stripe.com/v1/payment_intents")]
    #[case::trailing_slash("http://127.0.0.1:12111/", "http://127.0.0.1:12111/v1/payment_intents")]
    #[case::proxy_prefix("http://proxy.local/stripe", "http://proxy.local/stripe/v1/payment_intents")]
    fn endpoint_keeps_base_path(#[case] base: &str, #[case] expected: &str) {
        let base = Url::parse(base).expect("valid base url");
        let endpoint = payment_intents_endpoint(&base).expect("endpoint joins");
        assert_eq!(endpoint.as_str(), expected);
    }

    #[test]
    fn form_requests_card_payments_in_minor_units() {
        let form = intent_form(Amount::from_cents(5000), "USD");
        assert_eq!(
            form,
            [
                ("amount", "5000".to_owned()),
                ("currency", "usd".to_owned()),
                ("payment_method_types[]", "card".to_owned()),
            ]
        );
    }

    #[test]
    fn parses_client_secret() {
        let body = br#"{"id":"pi_1","object":"payment_intent","amount":5000,
            "currency":"usd","client_secret":"pi_1_secret_abc","status":"requires_payment_method"}"#;
        let intent = parse_intent(body).expect("intent decodes");
        assert_eq!(intent.client_secret, "pi_1_secret_abc");
        assert_eq!(intent.amount, Amount::from_cents(5000));
        assert_eq!(intent.currency, "usd");
    }

    #[test]
    fn missing_client_secret_is_rejected() {
        let body = br#"{"amount":5000,"currency":"usd","client_secret":null}"#;
        let err = parse_intent(body).expect_err("secret is required");
        assert!(matches!(err, PaymentGatewayError::Rejected { .. }));
    }

    #[rstest]
    #[case::bad_request(StatusCode::BAD_REQUEST, false)]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, false)]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case::bad_gateway(StatusCode::BAD_GATEWAY, true)]
    fn statuses_split_into_rejections_and_outages(
        #[case] status: StatusCode,
        #[case] is_connection: bool,
    ) {
        let err = map_status_error(status, b"");
        assert_eq!(
            matches!(err, PaymentGatewayError::Connection { .. }),
            is_connection
        );
    }

    #[test]
    fn provider_message_is_carried_into_the_error() {
        let body = br#"{"error":{"type":"invalid_request_error","message":"Amount must be at least 50 cents"}}"#;
        let err = map_status_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "payment provider rejected the request: status 400: Amount must be at least 50 cents"
        );
    }
}
