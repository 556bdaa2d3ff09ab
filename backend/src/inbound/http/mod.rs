//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers translate requests into [`AuthService`](crate::domain::AuthService)
//! and [`EnrollmentCoordinator`](crate::domain::EnrollmentCoordinator) calls;
//! they hold no business rules of their own.

pub mod auth;
pub mod enrollment;
pub mod error;
pub mod health;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod users;
pub mod validation;

pub use crate::domain::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler, with JSON, query and path extraction
/// failures rendered as `invalid_request` errors.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use enrollment::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    let json =
        web::JsonConfig::default().error_handler(|err, req| error::extractor_error(err, req));
    let query =
        web::QueryConfig::default().error_handler(|err, req| error::extractor_error(err, req));
    let path =
        web::PathConfig::default().error_handler(|err, req| error::extractor_error(err, req));
    cfg.app_data(json)
        .app_data(query)
        .app_data(path)
        .service(users::issue_token)
        .service(users::register_user)
        .service(users::list_users)
        .service(users::assign_role)
        .service(users::is_student)
        .service(users::is_instructor)
        .service(users::is_admin)
        .service(enrollment::select_class)
        .service(enrollment::list_selections)
        .service(enrollment::remove_selection)
        .service(enrollment::create_payment_intent)
        .service(enrollment::commit_payment)
        .service(enrollment::list_payments);
}
