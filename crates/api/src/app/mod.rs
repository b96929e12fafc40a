//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/notifier/codec wiring and user administration
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-wired services.
pub fn router(services: Arc<AppServices>) -> Router {
    let codec = services.codec.clone();

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(codec))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

pub use services::AppServices;
