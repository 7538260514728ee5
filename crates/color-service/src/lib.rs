//! HTTP endpoint for the accent color worker.
//!
//! Binds a loopback-only listener and exposes a single route,
//! `GET /setcolor?hex=<RRGGBB>`, which forwards to a
//! [`ColorApplier`](accent_color::ColorApplier) and maps the outcome to a
//! plain-text status. Everything else is a 404.

mod routes;
mod server;

pub use routes::{ServiceState, router};
pub use server::{ColorService, ServiceConfig};

/// Body for unknown routes and missing parameters.
pub const INVALID_ENDPOINT: &str = "Invalid endpoint. Use /setcolor?hex=#RRGGBB\n";

/// Body for a successful apply.
pub const COLOR_APPLIED: &str = "Color applied\n";

/// Body for any apply failure.
pub const APPLY_FAILED: &str = "Error applying color\n";

/// Errors produced by the color service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
