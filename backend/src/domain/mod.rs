//! Domain primitives, services and ports.
//!
//! Purpose: hold the enrollment and authorization rules independently of HTTP
//! and storage. Adapters talk to the domain through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Email, Role: credential store records.
//! - ClassOffering, Selection, PaymentRecord: catalog, selection and ledger
//!   records.
//! - AuthService: tokens, role checks, registration, role administration.
//! - EnrollmentCoordinator: selection lifecycle and the enrollment commit.

pub mod auth;
pub mod class_offering;
pub mod enrollment;
pub mod error;
pub mod payment;
pub mod ports;
pub mod selection;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    AuthService, IdentityClaims, Registration, RoleCheck, SessionToken, SigningKeyError,
    TokenError, TokenSigner, has_role, require_self_or_forbidden,
};
pub use self::class_offering::{
    ClassId, ClassOffering, ClassOfferingParts, ClassStatus, ClassValidationError,
};
pub use self::enrollment::{
    CommitFailure, CommitRequest, CommitResult, CommitStatus, CommitStep, EnrollmentCoordinator,
    EnrollmentPorts, StepOutcome, StepReport,
};
pub use self::error::{Error, ErrorCode};
pub use self::payment::{Amount, PaymentId, PaymentProof, PaymentRecord};
pub use self::selection::{Selection, SelectionId};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Email, Role, User, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use enrollment::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
