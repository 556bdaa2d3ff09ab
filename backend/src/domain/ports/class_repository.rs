//! Catalog store port. Read-only from this core: seat counters only change
//! inside an [`EnrollmentTransaction`](super::EnrollmentTransaction).

use async_trait::async_trait;

use crate::domain::{ClassId, ClassOffering};

use super::define_port_error;

define_port_error! {
    /// Errors raised by class repository adapters.
    pub enum ClassRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "class repository connection failed: {message}",
        /// Query failed or returned a row that violates class invariants.
        Query { message: String } => "class repository query failed: {message}",
    }
}

/// Catalog lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Fetch a class by id regardless of approval status.
    async fn find_by_id(&self, id: ClassId) -> Result<Option<ClassOffering>, ClassRepositoryError>;
}
