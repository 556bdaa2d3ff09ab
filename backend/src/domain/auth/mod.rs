//! Authentication and role-gated authorization.
//!
//! [`AuthService`] owns token issuance and verification plus every check that
//! consults the credential store. Role checks always re-read the store, so a
//! role change is visible on the very next request.

mod token;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{Email, Error, Role, User};

pub use token::{
    IdentityClaims, MIN_SECRET_LEN, SessionToken, SigningKeyError, TOKEN_TTL, TokenError,
    TokenSigner,
};

/// Whether `user` exists and holds exactly `role`.
///
/// # Examples
/// ```
/// use enrollment::domain::{Email, Role, User, has_role};
///
/// let ada = User::new(Email::new("ada@example.com").unwrap(), Role::Admin);
/// assert!(has_role(Some(&ada), Role::Admin));
/// assert!(!has_role(Some(&ada), Role::Student));
/// assert!(!has_role(None, Role::Admin));
/// ```
pub fn has_role(user: Option<&User>, role: Role) -> bool {
    user.is_some_and(|user| user.role() == role)
}

/// Whether the authenticated identity is the one being asked about.
///
/// Callers must stop when this returns `false`; the requested identity's
/// record is never to be read on behalf of someone else.
pub fn require_self_or_forbidden(identity: &IdentityClaims, requested: &Email) -> bool {
    &identity.email == requested
}

/// Outcome of an idempotent registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    /// A new student record was stored.
    Created,
    /// The email was already registered; nothing changed.
    AlreadyExists,
}

/// Answer to a self-service role question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCheck {
    /// Role that was asked about.
    pub role: Role,
    /// Whether the caller currently holds it.
    pub granted: bool,
}

pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    debug!(%error, "user repository failure");
    match error {
        UserRepositoryError::Connection { .. } => {
            Error::service_unavailable("credential store unavailable")
        }
        UserRepositoryError::Query { .. } => Error::internal("credential store error"),
    }
}

/// Token and role operations backed by the credential store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    signer: TokenSigner,
}

impl AuthService {
    /// Wire the service to a credential store and token signer.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, signer: TokenSigner) -> Self {
        Self { users, signer }
    }

    /// Sign a one-hour session token for `claims`.
    pub fn issue_token(&self, claims: &IdentityClaims) -> Result<SessionToken, Error> {
        self.signer.issue(claims).map_err(|error| {
            debug!(%error, "token encoding failed");
            Error::internal("token could not be issued")
        })
    }

    /// Issue a token for a registered user.
    ///
    /// The email is trusted as asserted by the upstream identity provider;
    /// only its presence in the credential store is checked. Unknown emails
    /// are `Unauthorized`.
    pub async fn sign_in(&self, email: Email) -> Result<SessionToken, Error> {
        let known = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repository_error)?
            .is_some();
        if !known {
            warn!(%email, "token requested for an unregistered email");
            return Err(Error::unauthorized("unauthorized access"));
        }
        self.issue_token(&IdentityClaims::new(email))
    }

    /// Decode a presented token. Absent, malformed or expired tokens are
    /// `Unauthorized`.
    pub fn verify_token(&self, token: Option<&str>) -> Result<IdentityClaims, Error> {
        token
            .ok_or(TokenError::Missing)
            .and_then(|raw| self.signer.verify(raw))
            .map_err(|error| {
                warn!(%error, "token rejected");
                Error::unauthorized("unauthorized access")
            })
    }

    /// Fail with `Forbidden` unless the identity's stored role is `role`.
    ///
    /// Returns the freshly read record on success.
    pub async fn require_role(&self, identity: &IdentityClaims, role: Role) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(&identity.email)
            .await
            .map_err(map_user_repository_error)?;
        match user {
            Some(user) if has_role(Some(&user), role) => Ok(user),
            _ => {
                warn!(email = %identity.email, required = %role, "role check failed");
                Err(Error::forbidden("forbidden access"))
            }
        }
    }

    /// Answer "does `requested` hold `role`" for the caller.
    ///
    /// Asking about anyone but yourself yields a denial without touching the
    /// store.
    pub async fn check_role(
        &self,
        identity: &IdentityClaims,
        requested: &Email,
        role: Role,
    ) -> Result<RoleCheck, Error> {
        if !require_self_or_forbidden(identity, requested) {
            warn!(email = %identity.email, requested = %requested, "cross-identity role check");
            return Ok(RoleCheck {
                role,
                granted: false,
            });
        }
        let user = self
            .users
            .find_by_email(requested)
            .await
            .map_err(map_user_repository_error)?;
        Ok(RoleCheck {
            role,
            granted: has_role(user.as_ref(), role),
        })
    }

    /// Store a new student record unless the email is already known.
    pub async fn register(
        &self,
        email: Email,
        name: Option<String>,
        photo_url: Option<String>,
    ) -> Result<Registration, Error> {
        let mut user = User::new(email, Role::Student);
        if let Some(name) = name {
            user = user.with_name(name);
        }
        if let Some(photo_url) = photo_url {
            user = user.with_photo_url(photo_url);
        }
        let created = self
            .users
            .insert_if_absent(&user)
            .await
            .map_err(map_user_repository_error)?;
        Ok(if created {
            Registration::Created
        } else {
            Registration::AlreadyExists
        })
    }

    /// All users; admin only.
    pub async fn list_users(&self, identity: &IdentityClaims) -> Result<Vec<User>, Error> {
        self.require_role(identity, Role::Admin).await?;
        self.users.list().await.map_err(map_user_repository_error)
    }

    /// Change `target`'s role; admin only.
    pub async fn assign_role(
        &self,
        identity: &IdentityClaims,
        target: &Email,
        role: Role,
    ) -> Result<(), Error> {
        self.require_role(identity, Role::Admin).await?;
        let updated = self
            .users
            .update_role(target, role)
            .await
            .map_err(map_user_repository_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {target} not found")));
        }
        tracing::info!(admin = %identity.email, target = %target, %role, "role assigned");
        Ok(())
    }

    /// Ensure `email` exists and is an admin. Used once at startup.
    pub async fn bootstrap_admin(&self, email: &Email) -> Result<(), Error> {
        let admin = User::new(email.clone(), Role::Admin);
        let created = self
            .users
            .insert_if_absent(&admin)
            .await
            .map_err(map_user_repository_error)?;
        if !created {
            self.users
                .update_role(email, Role::Admin)
                .await
                .map_err(map_user_repository_error)?;
        }
        tracing::info!(%email, created, "bootstrap admin ensured");
        Ok(())
    }
}
