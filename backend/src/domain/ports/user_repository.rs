//! Credential store port: user records keyed by email.

use async_trait::async_trait;

use crate::domain::{Email, Role, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

/// Read and administer user records.
///
/// Missing records are reported as `Ok(None)` / `Ok(false)`; errors are
/// reserved for connectivity and query failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError>;

    /// Insert `user` unless a record with the same email exists.
    ///
    /// Returns `true` when a new record was written.
    async fn insert_if_absent(&self, user: &User) -> Result<bool, UserRepositoryError>;

    /// Replace the role of an existing user. Returns `false` when no record
    /// matched.
    async fn update_role(&self, email: &Email, role: Role) -> Result<bool, UserRepositoryError>;

    /// Every known user, ordered by email.
    async fn list(&self) -> Result<Vec<User>, UserRepositoryError>;
}
