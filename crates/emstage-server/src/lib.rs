//! Static file server for emstage build output.
//!
//! # Lifecycle
//!
//! ```text
//! Starting ──bind──► Listening ──shutdown signal──► ShuttingDown ──► Stopped
//!     │                                                               ▲
//!     └──────────────────────── bind failure ─────────────────────────┘
//! ```
//!
//! The listening socket is owned by the serve future and released on every
//! exit path, so the same port can be bound again right after `Stopped`.

pub mod error;
pub mod routes;
pub mod shutdown;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;
use tokio::sync::watch;

pub use error::{ServerError, ServerResult};
pub use routes::create_router;
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory served as the site root.
    pub root: PathBuf,
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. `0` picks a free port.
    pub port: u16,
    /// File answering `/`.
    pub index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("build"),
            host: "127.0.0.1".to_string(),
            port: 8000,
            index: "index.html".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Lifecycle state of a [`StaticServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Serves one directory until its shutdown signal fires.
pub struct StaticServer {
    config: ServerConfig,
    state: watch::Sender<ServerState>,
    listener: Option<TcpListener>,
}

impl StaticServer {
    pub fn new(config: ServerConfig) -> Self {
        let (state, _) = watch::channel(ServerState::Starting);
        Self {
            config,
            state,
            listener: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch state transitions, including after the server is consumed.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Bind the listening socket and return the bound address.
    pub async fn bind(&mut self) -> ServerResult<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }
        let listener = self.bind_listener().await?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Serve requests until `shutdown` fires. Binds first if needed.
    pub async fn serve(mut self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => self.bind_listener().await?,
        };

        let router = create_router(&self.config.root, &self.config.index);
        let state = self.state.clone();

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                state.send_replace(ServerState::ShuttingDown);
                tracing::info!("Shutting down server");
            })
            .await;

        self.state.send_replace(ServerState::Stopped);

        match result {
            Ok(()) => {
                tracing::info!("Server shutdown complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Server error: {}", e);
                Err(e.into())
            }
        }
    }

    async fn bind_listener(&mut self) -> ServerResult<TcpListener> {
        let addr = self.config.socket_addr()?;
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                self.state.send_replace(ServerState::Listening);
                tracing::info!(
                    "Serving {} at http://{}",
                    self.config.root.display(),
                    listener.local_addr()?
                );
                Ok(listener)
            }
            Err(source) => {
                self.state.send_replace(ServerState::Stopped);
                Err(ServerError::Bind { addr, source })
            }
        }
    }
}

/// Serve `root` on `127.0.0.1:port` until `shutdown` fires.
pub async fn serve(
    root: impl AsRef<Path>,
    port: u16,
    shutdown: ShutdownSignal,
) -> ServerResult<()> {
    let config = ServerConfig {
        root: root.as_ref().to_path_buf(),
        port,
        ..ServerConfig::default()
    };
    StaticServer::new(config).serve(shutdown).await
}
