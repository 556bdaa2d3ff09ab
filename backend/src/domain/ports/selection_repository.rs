//! Selection store port: pending, unpaid class selections.

use async_trait::async_trait;

use crate::domain::{Email, Selection, SelectionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by selection repository adapters.
    pub enum SelectionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "selection repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "selection repository query failed: {message}",
        /// The student already holds a selection for this class.
        Duplicate { message: String } => "selection already exists: {message}",
    }
}

/// Pending selections: a student's basket before payment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Store a new selection.
    ///
    /// Fails with [`SelectionRepositoryError::Duplicate`] when the
    /// (student, class) pair is already selected.
    async fn insert(&self, selection: &Selection) -> Result<(), SelectionRepositoryError>;

    async fn find_by_id(
        &self,
        id: SelectionId,
    ) -> Result<Option<Selection>, SelectionRepositoryError>;

    /// The student's selections, oldest first.
    async fn list_for_student(
        &self,
        student: &Email,
    ) -> Result<Vec<Selection>, SelectionRepositoryError>;

    /// Delete a selection owned by `student`. Returns `false` when nothing
    /// matched, including selections that belong to someone else.
    async fn delete_for_student(
        &self,
        id: SelectionId,
        student: &Email,
    ) -> Result<bool, SelectionRepositoryError>;
}
