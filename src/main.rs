#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::ai::Analyzer;
use crate::ai::Transcriber;
use crate::api::JwtKeys;
use crate::events::EventBus;
use crate::profiles::ProfileSeeder;
use crate::storage::setup;
use crate::storage::Storage;
use crate::storage::StorageConfig;
use crate::utils::env_var_or_else;

mod ai;
mod api;
mod dates;
mod entries;
mod events;
mod graceful_shutdown;
mod password;
mod profiles;
mod service;
mod storage;
mod tags;
// the integration tests drive the local store variant
#[cfg(all(test, not(feature = "postgres")))]
mod tests;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "daybook=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6600";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(StorageConfig::Detect).await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load, like the
/// storage backend
pub async fn setup_app(config: StorageConfig) -> Result<Router> {
    let storage = setup(config).await;

    Ok(create_router(storage))
}

/// Create the router for Daybook
fn create_router<S: Storage>(storage: S) -> Router {
    let jwt_keys = setup_jwt_keys();
    let events = EventBus::new();
    let seeder = ProfileSeeder::from_env(events.clone());
    let analyzer = Analyzer::from_env();
    let transcriber = Transcriber::from_env();

    // observe profile changes the way mounted screens do in the app
    let mut profile_events = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = profile_events.recv().await {
            tracing::debug!(?event, "profile event");
        }
    });

    let media_dir = PathBuf::from(seeder.media_dir());

    Router::new()
        .nest("/api", api::router::<S>())
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(jwt_keys))
        .layer(Extension(events))
        .layer(Extension(seeder))
        .layer(Extension(analyzer))
        .layer(Extension(transcriber))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;
    use tracing_subscriber::EnvFilter;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> JwtKeys {
    use crate::password::generate;

    let jwt_secret = env_var_or_else("JWT_SECRET", || {
        let jwt_secret = generate();
        tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
        jwt_secret
    });

    JwtKeys::new(jwt_secret.as_bytes())
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Ok(port) = std::env::var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            let port = port.parse::<u16>()?;

            address.set_port(port);
        }
    }

    Ok(address)
}
