//! OpenAPI document for the REST API.
//!
//! Served by Swagger UI in debug builds. Every `/api/v1` operation except
//! token issuance and registration requires a bearer session token.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::PaymentIntent;
use crate::domain::{
    CommitFailure, CommitResult, CommitStatus, CommitStep, Error, ErrorCode, PaymentProof,
    PaymentRecord, Registration, Role, Selection, StepOutcome, StepReport, User,
};
use crate::inbound::http::enrollment::{
    CommitPaymentRequest, PaymentIntentRequest, SelectClassRequest,
};
use crate::inbound::http::users::{
    AssignRoleRequest, RegisterRequest, RegisterResponse, TokenRequest, TokenResponse,
};

/// Name of the bearer security scheme in the document.
pub const BEARER_SCHEME: &str = "BearerToken";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Session token issued by POST /api/v1/token."))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Class enrollment API",
        description = "Role checks, class selection and the enrollment commit."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::issue_token,
        crate::inbound::http::users::register_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::assign_role,
        crate::inbound::http::users::is_student,
        crate::inbound::http::users::is_instructor,
        crate::inbound::http::users::is_admin,
        crate::inbound::http::enrollment::select_class,
        crate::inbound::http::enrollment::list_selections,
        crate::inbound::http::enrollment::remove_selection,
        crate::inbound::http::enrollment::create_payment_intent,
        crate::inbound::http::enrollment::commit_payment,
        crate::inbound::http::enrollment::list_payments,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        Registration,
        Selection,
        PaymentIntent,
        PaymentProof,
        PaymentRecord,
        CommitResult,
        CommitStatus,
        CommitStep,
        CommitFailure,
        StepOutcome,
        StepReport,
        TokenRequest,
        TokenResponse,
        RegisterRequest,
        RegisterResponse,
        AssignRoleRequest,
        SelectClassRequest,
        PaymentIntentRequest,
        CommitPaymentRequest,
    )),
    tags(
        (name = "auth", description = "Session tokens"),
        (name = "users", description = "Registration and roles"),
        (name = "enrollment", description = "Selections, checkout and enrollment"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;
