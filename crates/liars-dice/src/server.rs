//! `LiarsDiceServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → rooms.

use std::sync::Arc;
use std::time::Instant;

use liars_dice_protocol::{Codec, JsonCodec};
use liars_dice_room::{RoomConfig, RoomManager};
use liars_dice_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::LiarsDiceError;
use crate::handler::handle_connection;

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
    pub(crate) started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started; the envelope timestamp.
    pub(crate) fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Builder for configuring and starting a server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), liars_dice::LiarsDiceError> {
/// use liars_dice::prelude::*;
///
/// let server = LiarsDiceServer::builder()
///     .bind("0.0.0.0:3001")
///     .room_config(RoomConfig { max_players: 4, ..RoomConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LiarsDiceServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl LiarsDiceServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener. Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build(self) -> Result<LiarsDiceServer<JsonCodec>, LiarsDiceError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.room_config)),
            codec: JsonCodec,
            started: Instant::now(),
        });

        Ok(LiarsDiceServer { transport, state })
    }
}

impl Default for LiarsDiceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server. Call [`run()`](Self::run) to start accepting players.
pub struct LiarsDiceServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl LiarsDiceServer {
    pub fn builder() -> LiarsDiceServerBuilder {
        LiarsDiceServerBuilder::new()
    }
}

impl<C: Codec> LiarsDiceServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    ///
    /// Runs until the task is dropped; a failed accept is logged and
    /// skipped.
    pub async fn run(mut self) -> Result<(), LiarsDiceError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            "Liar's Dice server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
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
