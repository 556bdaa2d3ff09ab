//! Unit-of-work port spanning the credential, catalog, selection and ledger
//! stores.
//!
//! The enrollment commit runs every write through one
//! [`EnrollmentTransaction`]: either [`EnrollmentTransaction::commit`] makes
//! all of them visible or none become visible. Dropping a transaction without
//! committing is equivalent to a rollback.

use async_trait::async_trait;

use crate::domain::{ClassId, Email, PaymentRecord, Selection, SelectionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by enrollment store adapters.
    pub enum EnrollmentStoreError {
        /// Store connection could not be established or was lost.
        Connection { message: String } => "enrollment store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "enrollment store query failed: {message}",
        /// A payment for this selection already exists.
        DuplicatePayment { message: String } => "payment already recorded: {message}",
    }
}

/// Outcome of the conditional seat decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatUpdate {
    /// One seat was taken.
    Taken,
    /// The class exists but has no seat left.
    SoldOut,
    /// No class matched the id.
    ClassMissing,
}

/// Opens transactions over the enrollment stores.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Start a transaction on a dedicated connection.
    async fn begin(&self) -> Result<Box<dyn EnrollmentTransaction>, EnrollmentStoreError>;
}

/// Operations available inside one enrollment transaction.
///
/// Writes are only visible to other transactions after `commit`.
#[async_trait]
pub trait EnrollmentTransaction: Send {
    /// Ledger entry already recorded for the selection, if any.
    async fn find_payment_for_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<Option<PaymentRecord>, EnrollmentStoreError>;

    /// Read the selection and hold it against concurrent consumers until the
    /// transaction ends.
    async fn lock_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<Option<Selection>, EnrollmentStoreError>;

    /// Append a ledger entry. Fails with
    /// [`EnrollmentStoreError::DuplicatePayment`] when the selection was
    /// already paid.
    async fn append_payment(&mut self, record: &PaymentRecord) -> Result<(), EnrollmentStoreError>;

    /// Returns `false` when the selection no longer exists.
    async fn remove_selection(&mut self, selection: SelectionId)
    -> Result<bool, EnrollmentStoreError>;

    /// Returns `false` when the class does not exist.
    async fn increment_enrolled(&mut self, class: ClassId) -> Result<bool, EnrollmentStoreError>;

    /// Decrement `available_seats` only if it is above zero.
    async fn take_seat(&mut self, class: ClassId) -> Result<SeatUpdate, EnrollmentStoreError>;

    /// Email of the class's owning instructor.
    async fn find_class_instructor(
        &mut self,
        class: ClassId,
    ) -> Result<Option<Email>, EnrollmentStoreError>;

    /// Add one to the instructor's `students` counter, creating it at 1.
    /// Returns `false` when no user record matched.
    async fn credit_instructor(&mut self, instructor: &Email)
    -> Result<bool, EnrollmentStoreError>;

    /// Make every write visible at once. A unique violation on the ledger
    /// surfaces as [`EnrollmentStoreError::DuplicatePayment`].
    async fn commit(self: Box<Self>) -> Result<(), EnrollmentStoreError>;

    /// Discard every write.
    async fn rollback(self: Box<Self>) -> Result<(), EnrollmentStoreError>;
}
