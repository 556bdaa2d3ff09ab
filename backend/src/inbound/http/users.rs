//! Token issuance, registration, role checks and role administration.
//!
//! ```text
//! POST /api/v1/token {"email":"ada@example.com"}
//! POST /api/v1/users {"email":"ada@example.com","name":"Ada"}
//! GET  /api/v1/users
//! PUT  /api/v1/users/{email}/role {"role":"instructor"}
//! GET  /api/v1/users/{email}/is-student
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, Registration, Role, SessionToken, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_email, parse_role};

/// Request body for `POST /api/v1/token`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(value_type = String)]
    pub token: SessionToken,
}

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub outcome: Registration,
    pub message: String,
}

/// Request body for `PUT /api/v1/users/{email}/role`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignRoleRequest {
    #[schema(example = "instructor")]
    pub role: String,
}

/// Issue a one-hour session token for a registered identity.
#[utoipa::path(
    post,
    path = "/api/v1/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Signed session token", body = TokenResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Email is not registered", body = Error),
        (status = 503, description = "Credential store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "issueToken",
    security([])
)]
#[post("/token")]
pub async fn issue_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let email = parse_email(&payload.email, FieldName::new("email"))?;
    let token = state.auth.sign_in(email).await?;
    Ok(web::Json(TokenResponse { token }))
}

/// Register a student. Registering a known email changes nothing.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 200, description = "User already exists", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Credential store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "registerUser",
    security([])
)]
#[post("/users")]
pub async fn register_user(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        email,
        name,
        photo_url,
    } = payload.into_inner();
    let email = parse_email(&email, FieldName::new("email"))?;
    let outcome = state.auth.register(email.clone(), name, photo_url).await?;
    let (mut response, message) = match outcome {
        Registration::Created => {
            info!(%email, "user registered");
            (HttpResponse::Created(), "user created")
        }
        Registration::AlreadyExists => (HttpResponse::Ok(), "user already exists"),
    };
    Ok(response.json(RegisterResponse {
        outcome,
        message: message.to_owned(),
    }))
}

/// List every user. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 503, description = "Credential store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    identity: Authenticated,
) -> ApiResult<web::Json<Vec<User>>> {
    let users = state.auth.list_users(identity.claims()).await?;
    Ok(web::Json(users))
}

/// Change a user's role. Admin only; takes effect on the next request.
#[utoipa::path(
    put,
    path = "/api/v1/users/{email}/role",
    params(("email" = String, Path, description = "Target user's email")),
    request_body = AssignRoleRequest,
    responses(
        (status = 204, description = "Role assigned"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "assignRole"
)]
#[put("/users/{email}/role")]
pub async fn assign_role(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
    payload: web::Json<AssignRoleRequest>,
) -> ApiResult<HttpResponse> {
    let target = parse_email(&path.into_inner(), FieldName::new("email"))?;
    let role = parse_role(&payload.role, FieldName::new("role"))?;
    state
        .auth
        .assign_role(identity.claims(), &target, role)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `{"<role>": bool}`. Asking about anyone else is always `false`.
async fn role_check(
    state: &HttpState,
    identity: &Authenticated,
    requested: &str,
    role: Role,
) -> Result<web::Json<Value>, Error> {
    let granted = match parse_email(requested, FieldName::new("email")) {
        Ok(email) => {
            state
                .auth
                .check_role(identity.claims(), &email, role)
                .await?
                .granted
        }
        Err(_) => false,
    };
    let mut body = Map::new();
    body.insert(role.as_str().to_owned(), Value::Bool(granted));
    Ok(web::Json(Value::Object(body)))
}

/// Whether the caller is a student.
#[utoipa::path(
    get,
    path = "/api/v1/users/{email}/is-student",
    params(("email" = String, Path, description = "Must be the caller's own email")),
    responses(
        (status = 200, description = "`{\"student\": bool}`"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "isStudent"
)]
#[get("/users/{email}/is-student")]
pub async fn is_student(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Value>> {
    role_check(&state, &identity, &path, Role::Student).await
}

/// Whether the caller is an instructor.
#[utoipa::path(
    get,
    path = "/api/v1/users/{email}/is-instructor",
    params(("email" = String, Path, description = "Must be the caller's own email")),
    responses(
        (status = 200, description = "`{\"instructor\": bool}`"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "isInstructor"
)]
#[get("/users/{email}/is-instructor")]
pub async fn is_instructor(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Value>> {
    role_check(&state, &identity, &path, Role::Instructor).await
}

/// Whether the caller is an admin.
#[utoipa::path(
    get,
    path = "/api/v1/users/{email}/is-admin",
    params(("email" = String, Path, description = "Must be the caller's own email")),
    responses(
        (status = 200, description = "`{\"admin\": bool}`"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "isAdmin"
)]
#[get("/users/{email}/is-admin")]
pub async fn is_admin(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Value>> {
    role_check(&state, &identity, &path, Role::Admin).await
}
