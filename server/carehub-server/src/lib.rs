//! CareHub Server - hospital management REST API
//!
//! This library wires the domain services (identity, hospital directory,
//! appointments, billing, medical records) into an axum router. The binary
//! in `main.rs` adds configuration loading, logging and the reminder
//! scheduler on top.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod scheduler;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::*;
pub use server::CareHubServer;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: CareHubServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
