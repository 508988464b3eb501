//! Server wiring and the websocket accept loop.
//!
//! This is the entry point for running a Linecall server. It ties the
//! layers together: gateway → registry → match, plus the HTTP sidecar
//! and the store mirror.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use linecall_protocol::PlayerId;
use linecall_room::RoomRegistry;
use linecall_store::{spawn_mirror, Store};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::gateway::handle_connection;
use crate::http::router;
use crate::{ServerConfig, ServerError};

/// Shared server state passed to each connection handler task and the
/// HTTP sidecar.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry synchronizes its own index maps; per-room work happens
/// inside room actors, so intents for different rooms never queue on
/// each other here.
pub struct ServerState {
    pub(crate) registry: RoomRegistry,
    /// `None` when Redis was unreachable at startup: the server then
    /// runs memory-only and the leaderboard reads as empty.
    pub(crate) store: Option<Store>,
    pub(crate) admin_token: String,
    pub(crate) next_player_id: AtomicU64,
}

impl ServerState {
    /// Issues the next connection-scoped player id.
    pub(crate) fn next_player_id(&self) -> PlayerId {
        PlayerId(self.next_player_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// A bound, not-yet-running Linecall server.
///
/// Binding is separate from running so callers (and tests) can read the
/// actual addresses before the accept loop starts.
pub struct LinecallServer {
    ws_listener: TcpListener,
    http_listener: TcpListener,
    sweep_interval: std::time::Duration,
    state: Arc<ServerState>,
}

impl LinecallServer {
    /// Binds both listeners and connects the store.
    ///
    /// A missing store config is fatal; an unreachable Redis is not.
    /// The mirror is best-effort and the server degrades to memory-only.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let registry =
            RoomRegistry::new(config.rules.clone(), config.room_ttl, updates_tx);

        let store = match Store::connect(&config.store_url).await {
            Ok(store) => {
                spawn_mirror(store.clone(), updates_rx);
                Some(store)
            }
            Err(err) => {
                tracing::warn!(%err, "store unreachable, running memory-only");
                None
            }
        };

        let ws_listener = TcpListener::bind(&config.ws_addr).await?;
        let http_listener = TcpListener::bind(&config.http_addr).await?;

        Ok(Self {
            ws_listener,
            http_listener,
            sweep_interval: config.sweep_interval,
            state: Arc::new(ServerState {
                registry,
                store,
                admin_token: config.admin_token,
                next_player_id: AtomicU64::new(1),
            }),
        })
    }

    /// The bound websocket address.
    pub fn ws_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.ws_listener.local_addr()
    }

    /// The bound HTTP sidecar address.
    pub fn http_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.http_listener.local_addr()
    }

    /// Runs the server: HTTP sidecar, idle sweep, and the websocket
    /// accept loop. Runs until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = router(Arc::clone(&self.state));
        let http_listener = self.http_listener;
        tokio::spawn(async move {
            if let Err(err) = axum::serve(http_listener, app).await {
                tracing::error!(%err, "http sidecar stopped");
            }
        });

        let sweep_state = Arc::clone(&self.state);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = sweep_state.registry.sweep().await;
                if removed > 0 {
                    tracing::info!(removed, "idle sweep");
                }
            }
        });

        tracing::info!("linecall server running");
        loop {
            match self.ws_listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, state).await {
                            tracing::debug!(%peer, error = %err, "connection ended with error");
                        }
                    });
                }
                Err(err) => {
                    tracing::error!(error = %err, "accept failed");
                }
            }
        }
    }
}
