// Library exports for Rinkside
// The embedding UI (and integration tests) build on these modules.

pub mod calendar;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod model;
pub mod notify;
pub mod session;
pub mod views;

use tracing_subscriber::EnvFilter;

/// Install the default tracing subscriber. Call once from the embedding
/// application's entry point.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
