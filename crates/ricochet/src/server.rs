//! `RicochetServer` builder and accept loop.
//!
//! This is the entry point for running a Ricochet server. It ties the
//! layers together: transport → protocol → rooms.

use std::sync::Arc;

use ricochet_protocol::{Codec, JsonCodec};
use ricochet_room::{RoomConfig, RoomRegistry};
use ricochet_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::RicochetError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry lock is held only to resolve room handles, never across
/// room calls' network effects.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Ricochet server.
///
/// # Example
///
/// ```rust,no_run
/// use ricochet::RicochetServer;
///
/// # async fn run() -> Result<(), ricochet::RicochetError> {
/// let server = RicochetServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RicochetServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl RicochetServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds the server. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<RicochetServer<JsonCodec>, RicochetError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.room_config)),
            codec: JsonCodec,
        });

        Ok(RicochetServer { transport, state })
    }
}

impl Default for RicochetServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Ricochet server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RicochetServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl RicochetServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RicochetServerBuilder {
        RicochetServerBuilder::new()
    }
}

impl<C> RicochetServer<C>
where
    C: Codec + Clone + Send + Sync + 'static,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, RicochetError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RicochetError> {
        tracing::info!("Ricochet server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
