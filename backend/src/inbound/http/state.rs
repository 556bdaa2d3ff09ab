//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use crate::domain::{AuthService, EnrollmentCoordinator};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub enrollment: EnrollmentCoordinator,
}

impl HttpState {
    /// Construct state from the two domain services.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use enrollment::domain::ports::FixturePaymentGateway;
    /// use enrollment::domain::{AuthService, EnrollmentCoordinator, EnrollmentPorts, TokenSigner};
    /// use enrollment::inbound::http::state::HttpState;
    /// use enrollment::outbound::memory::InMemoryStores;
    /// use mockable::DefaultClock;
    /// use zeroize::Zeroizing;
    ///
    /// let stores = InMemoryStores::new();
    /// let clock = Arc::new(DefaultClock);
    /// let signer = TokenSigner::new(Zeroizing::new(vec![7; 32]), clock.clone())
    ///     .expect("secret is long enough");
    /// let auth = AuthService::new(Arc::new(stores.clone()), signer);
    /// let enrollment = EnrollmentCoordinator::new(
    ///     EnrollmentPorts {
    ///         classes: Arc::new(stores.clone()),
    ///         selections: Arc::new(stores.clone()),
    ///         ledger: Arc::new(stores.clone()),
    ///         store: Arc::new(stores),
    ///         payments: Arc::new(FixturePaymentGateway),
    ///     },
    ///     clock,
    /// );
    /// let state = HttpState::new(auth, enrollment);
    /// let _auth = state.auth.clone();
    /// ```
    pub fn new(auth: AuthService, enrollment: EnrollmentCoordinator) -> Self {
        Self { auth, enrollment }
    }
}
