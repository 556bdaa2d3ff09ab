//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers that need a caller identity take [`Authenticated`] as an
//! argument; the extractor verifies the `Authorization: Bearer <token>` header
//! through [`AuthService`](crate::domain::AuthService) before the handler
//! body runs.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};

use crate::domain::{Error, IdentityClaims};
use crate::inbound::http::state::HttpState;

/// Identity decoded from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub IdentityClaims);

impl Authenticated {
    pub fn claims(&self) -> &IdentityClaims {
        &self.0
    }
}

/// Token portion of an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<HttpState>>() else {
            return ready(Err(Error::internal("http state not configured")));
        };
        ready(
            state
                .auth
                .verify_token(bearer_token(req))
                .map(Authenticated),
        )
    }
}
