//! Router, handlers, and middleware.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::{Mutex, mpsc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use accent_color::{ApplyError, ColorApplier, ConfigStoreWriter};
use accent_protocol::WorkerMessage;
use accent_protocol::constants::{HEX_QUERY_PARAM, SET_COLOR_PATH};

use crate::{APPLY_FAILED, COLOR_APPLIED, INVALID_ENDPOINT};

/// State shared by all requests.
pub struct ServiceState<S> {
    applier: ColorApplier<S>,
    /// Serialises applies so two requests never interleave store writes.
    apply_lock: Mutex<()>,
    notifier: Option<mpsc::UnboundedSender<WorkerMessage>>,
}

impl<S: ConfigStoreWriter> ServiceState<S> {
    pub fn new(applier: ColorApplier<S>) -> Self {
        Self {
            applier,
            apply_lock: Mutex::new(()),
            notifier: None,
        }
    }

    /// Sends a [`WorkerMessage::ColorApplied`] on `tx` after each success.
    pub fn with_notifier(mut self, tx: mpsc::UnboundedSender<WorkerMessage>) -> Self {
        self.notifier = Some(tx);
        self
    }

    async fn apply(&self, hex: &str) -> Result<(), ApplyError> {
        let _guard = self.apply_lock.lock().await;
        let color = self.applier.apply(hex).await?;

        if let Some(tx) = &self.notifier {
            // Informational only; a gone receiver is not an error.
            let _ = tx.send(WorkerMessage::ColorApplied { hex: color.hex() });
        }
        Ok(())
    }
}

/// Builds the service router.
///
/// With `allow_cross_origin`, `OPTIONS` requests short-circuit with `204`
/// and responses permit `GET`/`OPTIONS` from any origin.
pub fn router<S: ConfigStoreWriter>(
    state: Arc<ServiceState<S>>,
    allow_cross_origin: bool,
) -> Router {
    let mut app = Router::new()
        .route(
            SET_COLOR_PATH,
            // A bare `get` also serves HEAD, which must not apply a color.
            get(set_color::<S>).head(not_found).fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state);

    if allow_cross_origin {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS]);
        app = app
            .layer(cors)
            .layer(middleware::from_fn(preflight_no_content));
    }

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request| {
                tracing::info_span!("request", method = %req.method(), path = %req.uri().path())
            })
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

async fn set_color<S: ConfigStoreWriter>(
    State(state): State<Arc<ServiceState<S>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(hex) = params.get(HEX_QUERY_PARAM).filter(|h| !h.is_empty()) else {
        return not_found().await.into_response();
    };

    match state.apply(hex).await {
        Ok(()) => (StatusCode::OK, COLOR_APPLIED).into_response(),
        Err(e) => {
            // Malformed input is reported like a store failure.
            tracing::warn!(hex = %hex, "failed to apply color: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, APPLY_FAILED).into_response()
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, INVALID_ENDPOINT)
}

/// The CORS layer answers preflights with `200`; callers expect `204`.
async fn preflight_no_content(req: Request, next: Next) -> Response {
    let preflight = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
