//! Ledger store port (read side). Entries are only appended inside an
//! [`EnrollmentTransaction`](super::EnrollmentTransaction).

use async_trait::async_trait;

use crate::domain::{ClassId, Email, PaymentRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment ledger adapters.
    pub enum PaymentLedgerError {
        /// Ledger connection could not be established.
        Connection { message: String } => "payment ledger connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "payment ledger query failed: {message}",
    }
}

/// Read side of the payment ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// The student's payments, newest first.
    async fn list_for_student(
        &self,
        student: &Email,
    ) -> Result<Vec<PaymentRecord>, PaymentLedgerError>;

    /// Whether the student already paid for the class.
    async fn has_paid(&self, student: &Email, class: ClassId) -> Result<bool, PaymentLedgerError>;
}
