//! All API endpoint setup

use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;
use axum::Router;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use response::Error;
pub use response::Success;

use crate::storage::Storage;

mod analysis;
mod current_user;
mod entries;
mod profile;
mod request;
mod response;
mod settings;
mod tags;
mod users;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let users = Router::new()
        .route("/", post(users::create::<S>))
        .route("/token", post(users::token::<S>));

    let entries = Router::new()
        .route("/", get(entries::list::<S>))
        .route("/", post(entries::create::<S>))
        .route("/range", get(entries::range::<S>))
        .route("/search", get(entries::search::<S>))
        .route("/groups", get(entries::groups::<S>))
        .route("/stats", get(entries::stats::<S>))
        .route("/:entry", get(entries::single::<S>))
        .route("/:entry", patch(entries::update::<S>))
        .route("/:entry", delete(entries::delete::<S>));

    let profile = Router::new()
        .route("/", get(profile::single::<S>))
        .route("/", patch(profile::update::<S>));

    let settings = Router::new()
        .route("/:key", get(settings::single::<S>))
        .route("/:key", put(settings::update::<S>));

    Router::new()
        .nest("/users", users)
        .nest("/entries", entries)
        .nest("/profile", profile)
        .nest("/settings", settings)
        .route("/analysis", post(analysis::analyze::<S>))
        .route("/transcriptions", post(analysis::transcribe::<S>))
        .route("/tags", get(tags::suggestions::<S>))
}
