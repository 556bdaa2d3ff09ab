//! Enrollment server entry-point: loads settings, wires adapters and serves
//! the REST API.

mod server;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use enrollment::domain::TokenSigner;
use enrollment::inbound::http::health::HealthState;
use enrollment::outbound::payments::StripePaymentGateway;
use enrollment::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{AppSettings, ServerConfig, create_server, load_catalog};

const PAYMENT_TIMEOUT: Duration = Duration::from_secs(10);

async fn build_config(settings: &AppSettings) -> io::Result<ServerConfig> {
    let secret = settings.load_token_secret().map_err(io::Error::other)?;
    let signer = TokenSigner::new(secret, Arc::new(DefaultClock)).map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let mut config = ServerConfig::new(signer, bind_addr)
        .with_bootstrap_admin(settings.bootstrap_admin().map_err(io::Error::other)?);

    if let Some(database_url) = settings.database_url.as_deref() {
        run_migrations(database_url)
            .await
            .map_err(io::Error::other)?;
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .map_err(io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    if let Some(path) = settings.catalog_file.as_deref() {
        let classes = load_catalog(path).map_err(io::Error::other)?;
        info!(path = %path.display(), classes = classes.len(), "class catalog loaded");
        config = config.with_catalog(classes);
    }

    match settings
        .load_payment_secret_key()
        .map_err(io::Error::other)?
    {
        Some(key) => {
            let api_base = settings.payment_api_base().map_err(io::Error::other)?;
            let gateway = StripePaymentGateway::new(&api_base, key, PAYMENT_TIMEOUT)
                .map_err(io::Error::other)?;
            info!(api_base = %api_base, "payment intents via Stripe");
            config = config.with_payment_gateway(Arc::new(gateway));
        }
        None => warn!("no payment key configured; using the fixture payment gateway"),
    }
    Ok(config)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| io::Error::other(err.to_string()))?;
    let config = build_config(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config).await?;

    let draining = health_state.clone();
    actix_web::rt::spawn(async move {
        if actix_web::rt::signal::ctrl_c().await.is_ok() {
            draining.mark_unhealthy();
            info!("shutdown signal received; draining");
        }
    });

    server.await
}
