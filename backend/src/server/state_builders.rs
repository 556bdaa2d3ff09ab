//! Wire domain services to PostgreSQL or in-memory adapters.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::{info, warn};

use enrollment::domain::{
    AuthService, ClassOffering, EnrollmentCoordinator, EnrollmentPorts, Role, User,
};
use enrollment::inbound::http::state::HttpState;
use enrollment::outbound::memory::InMemoryStores;
use enrollment::outbound::persistence::{
    DieselClassRepository, DieselEnrollmentStore, DieselPaymentLedger, DieselSelectionRepository,
    DieselUserRepository,
};

use super::ServerConfig;

/// Classes and their instructors. Instructors must exist so commits can
/// credit them.
async fn seed_catalog(stores: &InMemoryStores, catalog: &[ClassOffering]) {
    for class in catalog {
        if stores.user(class.instructor_email()).await.is_none() {
            stores
                .seed_user(User::new(class.instructor_email().clone(), Role::Instructor))
                .await;
        }
        stores.seed_class(class.clone()).await;
    }
    info!(classes = catalog.len(), "in-memory catalog seeded");
}

/// Build the HTTP state from the configured adapters.
///
/// Without a pool every store is in memory and is lost on restart; the
/// catalog then holds only the classes from [`ServerConfig::with_catalog`].
pub(crate) async fn build_http_state(config: &ServerConfig) -> HttpState {
    let clock = Arc::new(DefaultClock);
    let (auth, ports) = match &config.db_pool {
        Some(pool) => {
            if !config.catalog.is_empty() {
                warn!("catalog file ignored; classes come from the database");
            }
            (
                AuthService::new(
                    Arc::new(DieselUserRepository::new(pool.clone())),
                    config.signer.clone(),
                ),
                EnrollmentPorts {
                    classes: Arc::new(DieselClassRepository::new(pool.clone())),
                    selections: Arc::new(DieselSelectionRepository::new(pool.clone())),
                    ledger: Arc::new(DieselPaymentLedger::new(pool.clone())),
                    store: Arc::new(DieselEnrollmentStore::new(pool.clone())),
                    payments: config.payments.clone(),
                },
            )
        }
        None => {
            warn!("no database configured; using in-memory stores");
            let stores = Arc::new(InMemoryStores::new());
            if config.catalog.is_empty() {
                warn!("no catalog file configured; no classes can be selected");
            } else {
                seed_catalog(&stores, &config.catalog).await;
            }
            (
                AuthService::new(stores.clone(), config.signer.clone()),
                EnrollmentPorts {
                    classes: stores.clone(),
                    selections: stores.clone(),
                    ledger: stores.clone(),
                    store: stores,
                    payments: config.payments.clone(),
                },
            )
        }
    };
    HttpState::new(auth, EnrollmentCoordinator::new(ports, clock))
}
