//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the domain store ports
//! backed by PostgreSQL via Diesel with async support through `diesel-async`
//! and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel rows and domain types. Enrollment rules live in the domain.
//! - **Internal models**: Row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **One transaction per commit**: [`DieselEnrollmentStore`] holds a pooled
//!   connection for the lifetime of an enrollment transaction.
//! - **Strongly typed errors**: Database failures are mapped onto each port's
//!   `Connection`/`Query` variants in `error_mapping.rs`.
//!
//! # Example
//!
//! ```ignore
//! use enrollment::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/enrollment")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_class_repository;
mod diesel_enrollment_store;
mod diesel_payment_ledger;
mod diesel_selection_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_class_repository::DieselClassRepository;
pub use diesel_enrollment_store::DieselEnrollmentStore;
pub use diesel_payment_ledger::DieselPaymentLedger;
pub use diesel_selection_repository::DieselSelectionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
