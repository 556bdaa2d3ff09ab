//! Payment provider outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `PaymentGateway`
//! port against Stripe's payment intents API.

mod dto;
mod stripe;

pub use stripe::{DEFAULT_STRIPE_API_BASE, StripePaymentGateway};
