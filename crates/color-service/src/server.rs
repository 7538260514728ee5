//! Color service listener.
//!
//! Binds `127.0.0.1:<port>` and serves the router until cancelled. The
//! host is not configurable: the endpoint writes to the user's registry
//! without authentication and must never be reachable from other machines.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use accent_color::{ColorApplier, ConfigStoreWriter};
use accent_protocol::{DEFAULT_PORT, WorkerMessage};

use crate::ServiceError;
use crate::routes::{ServiceState, router};

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// TCP port on the loopback interface (0 = OS-assigned).
    pub port: u16,
    /// Permit cross-origin `GET`/`OPTIONS` from any origin.
    pub allow_cross_origin: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allow_cross_origin: false,
        }
    }
}

impl ServiceConfig {
    /// The socket address the service binds.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}

/// The color service.
pub struct ColorService<S> {
    config: ServiceConfig,
    state: Arc<ServiceState<S>>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl<S: ConfigStoreWriter> ColorService<S> {
    /// Creates a service around `applier`.
    ///
    /// `notifier`, when given, receives a message for every applied color.
    pub fn new(
        config: ServiceConfig,
        applier: ColorApplier<S>,
        notifier: Option<mpsc::UnboundedSender<WorkerMessage>>,
    ) -> Arc<Self> {
        let mut state = ServiceState::new(applier);
        if let Some(tx) = notifier {
            state = state.with_notifier(tx);
        }

        Arc::new(Self {
            config,
            state: Arc::new(state),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the bound address. Only available after [`run`](Self::run) binds.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Stops accepting requests; in-flight ones run to completion.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the service until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServiceError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServiceError::Bind { addr, source })?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("color service listening on http://{local_addr}");

        let app = router(Arc::clone(&self.state), self.config.allow_cross_origin);
        let cancel = self.cancel.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("color service shut down");
        Ok(())
    }
}
