//! End-to-end enrollment flows over the full HTTP stack (tracing middleware,
//! extractor configuration and every `/api/v1` handler) backed by the
//! in-memory stores.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use futures::future::join_all;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use zeroize::Zeroizing;

use enrollment::Trace;
use enrollment::domain::ports::FixturePaymentGateway;
use enrollment::domain::{
    Amount, AuthService, ClassId, ClassOffering, ClassStatus, Email, EnrollmentCoordinator,
    EnrollmentPorts, IdentityClaims, Role, TRACE_ID_HEADER, TokenSigner, User,
};
use enrollment::inbound::http::configure_api;
use enrollment::inbound::http::state::HttpState;
use enrollment::outbound::memory::InMemoryStores;

const INSTRUCTOR: &str = "tutor@example.com";

fn email(raw: &str) -> Email {
    Email::new(raw).expect("valid email")
}

struct World {
    stores: InMemoryStores,
    state: HttpState,
}

impl World {
    async fn student(&self, raw: &str) -> String {
        self.user(raw, Role::Student).await
    }

    async fn user(&self, raw: &str, role: Role) -> String {
        self.stores.seed_user(User::new(email(raw), role)).await;
        let token = self
            .state
            .auth
            .issue_token(&IdentityClaims::new(email(raw)))
            .expect("token issues");
        format!("Bearer {}", token.as_str())
    }

    async fn class(&self, seats: u32) -> ClassId {
        self.stores
            .seed_user(User::new(email(INSTRUCTOR), Role::Instructor))
            .await;
        let class = ClassOffering::new(
            "Life drawing",
            email(INSTRUCTOR),
            Amount::from_cents(7_500),
            seats,
            ClassStatus::Approved,
        )
        .expect("valid class");
        let id = class.id();
        self.stores.seed_class(class).await;
        id
    }
}

#[fixture]
fn world() -> World {
    let stores = InMemoryStores::new();
    let shared = Arc::new(stores.clone());
    let clock = Arc::new(DefaultClock);
    let signer =
        TokenSigner::new(Zeroizing::new(vec![9; 48]), clock.clone()).expect("secret long enough");
    let enrollment = EnrollmentCoordinator::new(
        EnrollmentPorts {
            classes: shared.clone(),
            selections: shared.clone(),
            ledger: shared.clone(),
            store: shared.clone(),
            payments: Arc::new(FixturePaymentGateway),
        },
        clock,
    );
    World {
        state: HttpState::new(AuthService::new(shared, signer), enrollment),
        stores,
    }
}

async fn app(
    state: &HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await
}

async fn select(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    bearer: &str,
    class: ClassId,
) -> String {
    let body: Value = test::call_and_read_body_json(
        app,
        test::TestRequest::post()
            .uri("/api/v1/selections")
            .insert_header((AUTHORIZATION, bearer.to_owned()))
            .set_json(json!({ "classId": class.to_string() }))
            .to_request(),
    )
    .await;
    body.get("id")
        .and_then(Value::as_str)
        .expect("selection id")
        .to_owned()
}

fn commit_request(bearer: &str, class: ClassId, selection: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/v1/payments")
        .insert_header((AUTHORIZATION, bearer.to_owned()))
        .set_json(json!({
            "classId": class.to_string(),
            "selectionId": selection,
            "transactionId": format!("pi_{selection}"),
            "amount": 7_500,
        }))
        .to_request()
}

#[rstest]
#[actix_web::test]
async fn racing_students_never_oversell(world: World) {
    let class = world.class(2).await;
    let app = app(&world.state).await;

    let mut attempts = Vec::new();
    for n in 0..5 {
        let bearer = world.student(&format!("s{n}@example.com")).await;
        let selection = select(&app, &bearer, class).await;
        attempts.push((bearer, selection));
    }

    let commits = attempts.iter().map(|(bearer, selection)| {
        test::call_service(&app, commit_request(bearer, class, selection))
    });
    let responses = join_all(commits).await;
    let statuses: Vec<StatusCode> = responses.iter().map(ServiceResponse::status).collect();

    let won = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let lost = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!((won, lost), (2, 3), "statuses: {statuses:?}");

    let stored = world.stores.class(class).await.expect("class");
    assert_eq!(stored.available_seats(), 0);
    assert_eq!(stored.enrolled(), 2);
    assert_eq!(world.stores.payments().await.len(), 2);
    let instructor = world.stores.user(&email(INSTRUCTOR)).await.expect("instructor");
    assert_eq!(instructor.students(), Some(2));
}

#[rstest]
#[actix_web::test]
async fn errors_carry_the_response_trace_id(world: World) {
    let app = app(&world.state).await;
    let bearer = world.student("ada@example.com").await;

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/selections?email=grace@example.com")
            .insert_header((AUTHORIZATION, bearer))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body.get("traceId").and_then(Value::as_str), Some(header.as_str()));
}

#[rstest]
#[case(r#"{"classId": 7}"#)]
#[case("not json")]
#[actix_web::test]
async fn malformed_bodies_use_the_error_shape(world: World, #[case] body: &str) {
    let app = app(&world.state).await;
    let bearer = world.student("ada@example.com").await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/selections")
            .insert_header((AUTHORIZATION, bearer))
            .insert_header(("content-type", "application/json"))
            .set_payload(body.to_owned())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body.get("code"), Some(&json!("invalid_request")));
}

#[rstest]
#[actix_web::test]
async fn admin_promotes_an_instructor(world: World) {
    let app = app(&world.state).await;
    let admin = world.user("root@example.com", Role::Admin).await;
    let candidate = world.student("new@example.com").await;

    let before: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/new@example.com/is-instructor")
            .insert_header((AUTHORIZATION, candidate.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(before, json!({ "instructor": false }));

    let assigned = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/v1/users/new@example.com/role")
            .insert_header((AUTHORIZATION, admin))
            .set_json(json!({ "role": "instructor" }))
            .to_request(),
    )
    .await;
    assert_eq!(assigned.status(), StatusCode::NO_CONTENT);

    let after: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/new@example.com/is-instructor")
            .insert_header((AUTHORIZATION, candidate))
            .to_request(),
    )
    .await;
    assert_eq!(after, json!({ "instructor": true }));
}
