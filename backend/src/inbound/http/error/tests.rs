//! Tests for HTTP error rendering.

use super::*;
use actix_web::body::to_bytes;
use actix_web::http::header::HeaderName;
use rstest::rstest;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("unauthorized access"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("forbidden access"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("seat no longer available"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("store down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

fn header(response: &HttpResponse, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn body_of(response: HttpResponse) -> Error {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error JSON deserialises")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace_id() {
    let error = Error::internal("connection string leaked")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}));

    let response = error.error_response();
    assert_eq!(
        header(&response, HeaderName::from_static(TRACE_ID_HEADER)).as_deref(),
        Some(TRACE_ID)
    );
    let body = body_of(response).await;
    assert_eq!(body.code(), ErrorCode::InternalError);
    assert_eq!(body.message(), "Internal server error");
    assert_eq!(body.trace_id(), Some(TRACE_ID));
    assert!(body.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn conflicts_keep_message_and_step_details() {
    let details = json!({"failedStep": "decrement_seats", "steps": []});
    let error = Error::conflict("seat no longer available").with_details(details.clone());

    let body = body_of(error.error_response()).await;
    assert_eq!(body.message(), "seat no longer available");
    assert_eq!(body.details(), Some(&details));
}

#[rstest]
#[case(Error::unauthorized("unauthorized access"), WWW_AUTHENTICATE, "Bearer")]
#[case(Error::service_unavailable("store down"), RETRY_AFTER, RETRY_AFTER_SECS)]
#[case(Error::forbidden("forbidden access"), CACHE_CONTROL, "no-store")]
fn status_specific_headers(#[case] err: Error, #[case] name: HeaderName, #[case] value: &str) {
    let response = err.error_response();
    assert_eq!(header(&response, name).as_deref(), Some(value));
}

#[rstest]
fn errors_without_trace_id_omit_the_header() {
    let response = Error::invalid_request("bad").error_response();
    assert!(header(&response, HeaderName::from_static(TRACE_ID_HEADER)).is_none());
}
