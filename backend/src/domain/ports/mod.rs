//! Domain ports for the hexagonal boundary.
//!
//! Store ports are injected into the services as `Arc<dyn Port>` so tests can
//! swap in fakes; nothing in the domain holds a global store handle.

mod macros;
pub(crate) use macros::define_port_error;

mod class_repository;
mod enrollment_store;
mod payment_gateway;
mod payment_ledger;
mod selection_repository;
mod user_repository;

#[cfg(test)]
pub use class_repository::MockClassRepository;
pub use class_repository::{ClassRepository, ClassRepositoryError};
pub use enrollment_store::{
    EnrollmentStore, EnrollmentStoreError, EnrollmentTransaction, SeatUpdate,
};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    FixturePaymentGateway, PaymentGateway, PaymentGatewayError, PaymentIntent,
};
#[cfg(test)]
pub use payment_ledger::MockPaymentLedger;
pub use payment_ledger::{PaymentLedger, PaymentLedgerError};
#[cfg(test)]
pub use selection_repository::MockSelectionRepository;
pub use selection_repository::{SelectionRepository, SelectionRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
