//! Selection, checkout and enrollment commit handlers.
//!
//! ```text
//! POST   /api/v1/selections {"classId":"..."}
//! GET    /api/v1/selections?email=ada@example.com
//! DELETE /api/v1/selections/{id}
//! POST   /api/v1/payment-intents {"selectionId":"..."}
//! POST   /api/v1/payments {"classId":"...","selectionId":"...","transactionId":"pi_...","amount":5000}
//! GET    /api/v1/payments?email=ada@example.com
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::PaymentIntent;
use crate::domain::{
    CommitRequest, CommitResult, CommitStatus, Email, Error, IdentityClaims, PaymentProof,
    PaymentRecord, Role, Selection, require_self_or_forbidden,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_amount, parse_class_id, parse_email, parse_selection_id, require_text,
};

/// Query string shared by the per-student listings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct EmailQuery {
    /// The caller's own email. Omitting it yields an empty list.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectClassRequest {
    #[schema(format = "uuid")]
    pub class_id: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    #[schema(format = "uuid")]
    pub selection_id: String,
}

/// Proof of a provider-confirmed payment for one selection.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitPaymentRequest {
    #[schema(format = "uuid")]
    pub class_id: String,
    #[schema(format = "uuid")]
    pub selection_id: String,
    #[schema(example = "pi_3NxYz")]
    pub transaction_id: Option<String>,
    /// Amount charged, in cents.
    #[schema(example = 5000)]
    pub amount: u64,
}

/// Resolve the `email` query for a self-only listing.
///
/// `Ok(None)` means the query was absent and the listing is empty.
fn listing_owner(identity: &IdentityClaims, query: &EmailQuery) -> Result<Option<Email>, Error> {
    let Some(raw) = query.email.as_deref().filter(|raw| !raw.trim().is_empty()) else {
        return Ok(None);
    };
    let requested = parse_email(raw, FieldName::new("email"))?;
    if !require_self_or_forbidden(identity, &requested) {
        return Err(Error::forbidden("forbidden access"));
    }
    Ok(Some(requested))
}

fn commit_request(student: Email, body: CommitPaymentRequest) -> Result<CommitRequest, Error> {
    Ok(CommitRequest {
        student,
        class_id: parse_class_id(&body.class_id, FieldName::new("classId"))?,
        selection_id: parse_selection_id(&body.selection_id, FieldName::new("selectionId"))?,
        proof: PaymentProof {
            transaction_id: require_text(body.transaction_id, FieldName::new("transactionId"))?,
            amount: parse_amount(body.amount, FieldName::new("amount"))?,
        },
    })
}

/// Select an approved class with a free seat. Students only.
#[utoipa::path(
    post,
    path = "/api/v1/selections",
    request_body = SelectClassRequest,
    responses(
        (status = 201, description = "Selection created", body = Selection),
        (status = 400, description = "Invalid request or class not approved", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a student", body = Error),
        (status = 404, description = "No such class", body = Error),
        (status = 409, description = "Already selected, already paid, or full", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "selectClass"
)]
#[post("/selections")]
pub async fn select_class(
    state: web::Data<HttpState>,
    identity: Authenticated,
    payload: web::Json<SelectClassRequest>,
) -> ApiResult<HttpResponse> {
    let class_id = parse_class_id(&payload.class_id, FieldName::new("classId"))?;
    let student = state
        .auth
        .require_role(identity.claims(), Role::Student)
        .await?;
    let selection = state
        .enrollment
        .select_class(student.email(), class_id)
        .await?;
    Ok(HttpResponse::Created().json(selection))
}

/// The caller's pending selections.
#[utoipa::path(
    get,
    path = "/api/v1/selections",
    params(EmailQuery),
    responses(
        (status = 200, description = "Selections, oldest first", body = [Selection]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Email is not the caller's", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "listSelections"
)]
#[get("/selections")]
pub async fn list_selections(
    state: web::Data<HttpState>,
    identity: Authenticated,
    query: web::Query<EmailQuery>,
) -> ApiResult<web::Json<Vec<Selection>>> {
    let Some(student) = listing_owner(identity.claims(), &query)? else {
        return Ok(web::Json(Vec::new()));
    };
    let selections = state.enrollment.list_selections(&student).await?;
    Ok(web::Json(selections))
}

/// Drop one of the caller's selections.
#[utoipa::path(
    delete,
    path = "/api/v1/selections/{id}",
    params(("id" = String, Path, format = Uuid, description = "Selection id")),
    responses(
        (status = 204, description = "Selection removed"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No such selection for the caller", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "removeSelection"
)]
#[delete("/selections/{id}")]
pub async fn remove_selection(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_selection_id(&path, FieldName::new("id"))?;
    state
        .enrollment
        .remove_selection(&identity.claims().email, id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Create a payment intent for a selection's price snapshot.
#[utoipa::path(
    post,
    path = "/api/v1/payment-intents",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = PaymentIntent),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No such selection for the caller", body = Error),
        (status = 503, description = "Payment provider unavailable", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "createPaymentIntent"
)]
#[post("/payment-intents")]
pub async fn create_payment_intent(
    state: web::Data<HttpState>,
    identity: Authenticated,
    payload: web::Json<PaymentIntentRequest>,
) -> ApiResult<web::Json<PaymentIntent>> {
    let id = parse_selection_id(&payload.selection_id, FieldName::new("selectionId"))?;
    let intent = state
        .enrollment
        .prepare_payment(&identity.claims().email, id)
        .await?;
    Ok(web::Json(intent))
}

/// Commit a paid selection. Students only.
///
/// Responds `201` with the per-step report on the first commit and `200` when
/// the selection had already been committed. Aborted commits respond with the
/// error for the failing step and the step report in `details.steps`.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = CommitPaymentRequest,
    responses(
        (status = 201, description = "Enrollment committed", body = CommitResult),
        (status = 200, description = "Already committed; original payment returned", body = CommitResult),
        (status = 400, description = "Proof does not match the selection", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a student, or not the caller's selection", body = Error),
        (status = 404, description = "No such selection or class", body = Error),
        (status = 409, description = "Seat no longer available", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "commitEnrollment"
)]
#[post("/payments")]
pub async fn commit_payment(
    state: web::Data<HttpState>,
    identity: Authenticated,
    payload: web::Json<CommitPaymentRequest>,
) -> ApiResult<HttpResponse> {
    let student = state
        .auth
        .require_role(identity.claims(), Role::Student)
        .await?;
    let request = commit_request(student.email().clone(), payload.into_inner())?;
    let result = state
        .enrollment
        .commit_enrollment(request)
        .await
        .into_result()?;
    let mut response = match result.status {
        CommitStatus::Committed => HttpResponse::Created(),
        CommitStatus::Replayed | CommitStatus::Aborted => HttpResponse::Ok(),
    };
    Ok(response.json(result))
}

/// The caller's payment history, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(EmailQuery),
    responses(
        (status = 200, description = "Payments, newest first", body = [PaymentRecord]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Email is not the caller's", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "listPayments"
)]
#[get("/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    identity: Authenticated,
    query: web::Query<EmailQuery>,
) -> ApiResult<web::Json<Vec<PaymentRecord>>> {
    let Some(student) = listing_owner(identity.claims(), &query)? else {
        return Ok(web::Json(Vec::new()));
    };
    let payments = state.enrollment.list_payments(&student).await?;
    Ok(web::Json(payments))
}

#[cfg(test)]
#[path = "enrollment_tests.rs"]
mod tests;
