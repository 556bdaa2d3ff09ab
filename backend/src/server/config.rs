//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use enrollment::domain::ports::{FixturePaymentGateway, PaymentGateway};
use enrollment::domain::{ClassOffering, Email, TokenSigner};
use enrollment::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) signer: TokenSigner,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) payments: Arc<dyn PaymentGateway>,
    pub(crate) bootstrap_admin: Option<Email>,
    pub(crate) catalog: Vec<ClassOffering>,
}

impl ServerConfig {
    /// In-memory stores and the fixture payment gateway until told otherwise.
    #[must_use]
    pub fn new(signer: TokenSigner, bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            signer,
            db_pool: None,
            payments: Arc::new(FixturePaymentGateway),
            bootstrap_admin: None,
            catalog: Vec::new(),
        }
    }

    /// Back every store port with PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Create payment intents through `payments` instead of the fixture.
    #[must_use]
    pub fn with_payment_gateway(mut self, payments: Arc<dyn PaymentGateway>) -> Self {
        self.payments = payments;
        self
    }

    /// Grant `email` the admin role before the server accepts traffic.
    #[must_use]
    pub fn with_bootstrap_admin(mut self, email: Option<Email>) -> Self {
        self.bootstrap_admin = email;
        self
    }

    /// Classes to seed into the in-memory catalog. Unused with a database.
    #[must_use]
    pub fn with_catalog(mut self, classes: Vec<ClassOffering>) -> Self {
        self.catalog = classes;
        self
    }
}
