//! Tests for the selection and enrollment commit handlers.

use super::*;
use crate::domain::{Amount, ClassOffering, ClassStatus};
use crate::inbound::http::test_utils::{TestState, email};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

const PRICE: Amount = Amount::from_cents(5_000);
const NIL: &str = "00000000-0000-0000-0000-000000000000";

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .service(select_class)
            .service(list_selections)
            .service(remove_selection)
            .service(create_payment_intent)
            .service(commit_payment)
            .service(list_payments),
    )
}

async fn seed_class(harness: &TestState, seats: u32) -> ClassOffering {
    harness
        .sign_in("tutor@example.com", Role::Instructor)
        .await;
    let class = ClassOffering::new(
        "Watercolour",
        email("tutor@example.com"),
        PRICE,
        seats,
        ClassStatus::Approved,
    )
    .expect("valid class");
    harness.stores.seed_class(class.clone()).await;
    class
}

fn select(bearer: &str, class: &ClassOffering) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri("/api/v1/selections")
        .insert_header((AUTHORIZATION, bearer.to_owned()))
        .set_json(json!({ "classId": class.id().to_string() }))
}

fn commit(bearer: &str, class: &ClassOffering, selection_id: &str) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri("/api/v1/payments")
        .insert_header((AUTHORIZATION, bearer.to_owned()))
        .set_json(json!({
            "classId": class.id().to_string(),
            "selectionId": selection_id,
            "transactionId": "pi_test",
            "amount": PRICE.cents(),
        }))
}

fn selection_id(body: &Value) -> String {
    body.get("id")
        .and_then(Value::as_str)
        .expect("selection id")
        .to_owned()
}

#[actix_web::test]
async fn select_pay_and_commit() {
    let harness = TestState::new();
    let class = seed_class(&harness, 3).await;
    let student = harness.sign_in("ada@example.com", Role::Student).await;
    let app = actix_test::init_service(test_app(harness.state.clone())).await;

    let selected = actix_test::call_service(&app, select(&student, &class).to_request()).await;
    assert_eq!(selected.status(), StatusCode::CREATED);
    let selection: Value = actix_test::read_body_json(selected).await;
    assert_eq!(selection.get("price"), Some(&json!(5_000)));
    let id = selection_id(&selection);

    let listed: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/selections?email=ada@example.com")
            .insert_header((AUTHORIZATION, student.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let intent: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payment-intents")
            .insert_header((AUTHORIZATION, student.clone()))
            .set_json(json!({ "selectionId": id }))
            .to_request(),
    )
    .await;
    assert_eq!(intent.get("amount"), Some(&json!(5_000)));
    assert_eq!(intent.get("currency"), Some(&json!("usd")));
    assert!(intent.get("clientSecret").and_then(Value::as_str).is_some());

    let committed =
        actix_test::call_service(&app, commit(&student, &class, &id).to_request()).await;
    assert_eq!(committed.status(), StatusCode::CREATED);
    let result: Value = actix_test::read_body_json(committed).await;
    assert_eq!(result.get("status"), Some(&json!("committed")));

    let stored = harness.stores.class(class.id()).await.expect("class");
    assert_eq!(stored.available_seats(), 2);
    assert_eq!(stored.enrolled(), 1);
    let instructor = harness
        .stores
        .user(&email("tutor@example.com"))
        .await
        .expect("instructor");
    assert_eq!(instructor.students(), Some(1));

    let payments: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/payments?email=ada@example.com")
            .insert_header((AUTHORIZATION, student))
            .to_request(),
    )
    .await;
    assert_eq!(payments.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn repeated_commit_replays_the_original_payment() {
    let harness = TestState::new();
    let class = seed_class(&harness, 3).await;
    let student = harness.sign_in("ada@example.com", Role::Student).await;
    let app = actix_test::init_service(test_app(harness.state.clone())).await;
    let selection: Value =
        actix_test::call_and_read_body_json(&app, select(&student, &class).to_request()).await;
    let id = selection_id(&selection);

    let first = actix_test::call_service(&app, commit(&student, &class, &id).to_request()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = actix_test::call_service(&app, commit(&student, &class, &id).to_request()).await;
    assert_eq!(second.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(second).await;
    assert_eq!(body.get("status"), Some(&json!("replayed")));

    assert_eq!(harness.stores.payments().await.len(), 1);
    let stored = harness.stores.class(class.id()).await.expect("class");
    assert_eq!(stored.available_seats(), 2);
}

#[actix_web::test]
async fn losing_the_last_seat_reports_every_step() {
    let harness = TestState::new();
    let class = seed_class(&harness, 1).await;
    let first = harness.sign_in("a@example.com", Role::Student).await;
    let second = harness.sign_in("b@example.com", Role::Student).await;
    let app = actix_test::init_service(test_app(harness.state.clone())).await;

    let a: Value =
        actix_test::call_and_read_body_json(&app, select(&first, &class).to_request()).await;
    let b: Value =
        actix_test::call_and_read_body_json(&app, select(&second, &class).to_request()).await;

    let (a_id, b_id) = (selection_id(&a), selection_id(&b));
    let won =
        actix_test::call_service(&app, commit(&first, &class, &a_id).to_request()).await;
    assert_eq!(won.status(), StatusCode::CREATED);

    let lost =
        actix_test::call_service(&app, commit(&second, &class, &b_id).to_request()).await;
    assert_eq!(lost.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(lost).await;
    assert_eq!(body.get("message"), Some(&json!("seat no longer available")));
    let steps = body
        .pointer("/details/steps")
        .and_then(Value::as_array)
        .expect("step report");
    assert_eq!(steps.len(), 5);

    assert_eq!(harness.stores.payments().await.len(), 1);
    let stored = harness.stores.class(class.id()).await.expect("class");
    assert_eq!(stored.available_seats(), 0);
    assert_eq!(stored.enrolled(), 1);
}

#[actix_web::test]
async fn instructors_cannot_select_classes() {
    let harness = TestState::new();
    let class = seed_class(&harness, 3).await;
    let instructor = harness.bearer("tutor@example.com");
    let app = actix_test::init_service(test_app(harness.state.clone())).await;

    let response = actix_test::call_service(&app, select(&instructor, &class).to_request()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[case("/api/v1/selections")]
#[case("/api/v1/payments")]
#[actix_web::test]
async fn listings_are_self_only(#[case] path: &str) {
    let harness = TestState::new();
    let student = harness.sign_in("a@example.com", Role::Student).await;
    let app = actix_test::init_service(test_app(harness.state.clone())).await;

    let other = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("{path}?email=b@example.com"))
            .insert_header((AUTHORIZATION, student.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(other).await;
    assert_eq!(body.get("message"), Some(&json!("forbidden access")));

    let missing: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri(path)
            .insert_header((AUTHORIZATION, student))
            .to_request(),
    )
    .await;
    assert_eq!(missing, json!([]));
}

#[actix_web::test]
async fn removing_a_selection_twice_is_not_found() {
    let harness = TestState::new();
    let class = seed_class(&harness, 3).await;
    let student = harness.sign_in("ada@example.com", Role::Student).await;
    let app = actix_test::init_service(test_app(harness.state.clone())).await;
    let selection: Value =
        actix_test::call_and_read_body_json(&app, select(&student, &class).to_request()).await;
    let uri = format!("/api/v1/selections/{}", selection_id(&selection));
    let remove = || {
        actix_test::TestRequest::delete()
            .uri(&uri)
            .insert_header((AUTHORIZATION, student.clone()))
            .to_request()
    };

    let first = actix_test::call_service(&app, remove()).await;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    let second = actix_test::call_service(&app, remove()).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case(json!({"classId": "nope", "selectionId": "nope", "transactionId": "pi", "amount": 1}))]
#[case(json!({"classId": NIL, "selectionId": NIL, "amount": 5000}))]
#[case(json!({"classId": NIL, "selectionId": NIL, "transactionId": "pi", "amount": 0}))]
#[actix_web::test]
async fn malformed_commit_requests_are_rejected(#[case] payload: Value) {
    let harness = TestState::new();
    let student = harness.sign_in("ada@example.com", Role::Student).await;
    let app = actix_test::init_service(test_app(harness.state.clone())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments")
            .insert_header((AUTHORIZATION, student))
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
