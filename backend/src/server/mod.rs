//! Server construction and middleware wiring.

mod catalog;
mod config;
mod settings;
mod state_builders;

pub use catalog::load_catalog;
pub use config::ServerConfig;
pub use settings::{AppSettings, SettingsError};

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use enrollment::Trace;
#[cfg(debug_assertions)]
use enrollment::doc::ApiDoc;
use enrollment::inbound::http::configure_api;
use enrollment::inbound::http::health::{HealthState, live, ready};
use enrollment::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Wire the domain services, ensure the bootstrap admin, bind and start the
/// server, then mark it ready.
///
/// # Errors
/// Propagates [`std::io::Error`] when bootstrapping the admin, binding the
/// socket or starting the server fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config).await);
    if let Some(admin) = &config.bootstrap_admin {
        http_state
            .auth
            .bootstrap_admin(admin)
            .await
            .map_err(|err| std::io::Error::other(format!("bootstrap admin failed: {err}")))?;
    }

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    info!(bind_addr = %config.bind_addr, "server listening");
    health_state.mark_ready();
    Ok(server)
}
