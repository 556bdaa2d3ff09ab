//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use mockable::DefaultClock;
use zeroize::Zeroizing;

use crate::domain::ports::FixturePaymentGateway;
use crate::domain::{
    AuthService, Email, EnrollmentCoordinator, EnrollmentPorts, IdentityClaims, Role, TokenSigner,
    User,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryStores;

pub(crate) fn email(raw: &str) -> Email {
    Email::new(raw).expect("valid email")
}

/// HTTP state over fresh in-memory stores, plus direct store access for
/// seeding and assertions.
pub(crate) struct TestState {
    pub stores: InMemoryStores,
    pub state: HttpState,
}

impl TestState {
    pub fn new() -> Self {
        let stores = InMemoryStores::new();
        let clock = Arc::new(DefaultClock);
        let signer = TokenSigner::new(Zeroizing::new(vec![42; 32]), clock.clone())
            .expect("test secret is long enough");
        let shared = Arc::new(stores.clone());
        let auth = AuthService::new(shared.clone(), signer);
        let enrollment = EnrollmentCoordinator::new(
            EnrollmentPorts {
                classes: shared.clone(),
                selections: shared.clone(),
                ledger: shared.clone(),
                store: shared,
                payments: Arc::new(FixturePaymentGateway),
            },
            clock,
        );
        Self {
            stores,
            state: HttpState::new(auth, enrollment),
        }
    }

    /// Seed a user and return a bearer header value for them.
    pub async fn sign_in(&self, raw_email: &str, role: Role) -> String {
        self.stores.seed_user(User::new(email(raw_email), role)).await;
        self.bearer(raw_email)
    }

    /// Bearer header value for an identity, whether or not it is stored.
    pub fn bearer(&self, raw_email: &str) -> String {
        let token = self
            .state
            .auth
            .issue_token(&IdentityClaims::new(email(raw_email)))
            .expect("token issues");
        format!("Bearer {}", token.as_str())
    }
}
