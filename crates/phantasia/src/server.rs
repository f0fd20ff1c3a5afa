//! `PhantasiaServer` builder and accept loop.
//!
//! This is the entry point for running a Phantasia server. It ties the
//! layers together: transport → protocol → rooms.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use phantasia_protocol::{Codec, JsonCodec};
use phantasia_room::{ActorFactory, GameConfig, RoomRegistry};
use phantasia_transport::{Transport, WebSocketTransport};

use crate::PhantasiaError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// registry locks its own map, so connections in different rooms never
/// wait on each other.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomRegistry,
    pub(crate) codec: C,
    /// Applies to connections that have not joined a room.
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Phantasia server.
///
/// # Example
///
/// ```rust,no_run
/// use phantasia::PhantasiaServer;
///
/// # async fn start() -> Result<(), phantasia::PhantasiaError> {
/// let server = PhantasiaServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PhantasiaServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    idle_timeout: Option<Duration>,
    seed: Option<u64>,
}

impl PhantasiaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            idle_timeout: None,
            seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the game tuning used by every room.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Drops connections that send nothing for `timeout` before joining a
    /// room. Joined connections are passive listeners and never time out.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Seeds every room's dice for reproducible sessions.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the game config, binds the listener, and returns the
    /// server ready to [`run`](PhantasiaServer::run).
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<PhantasiaServer<JsonCodec>, PhantasiaError> {
        self.game_config.validate()?;
        let config = Arc::new(self.game_config);
        let factory = match self.seed {
            Some(seed) => ActorFactory::seeded(config, seed),
            None => ActorFactory::new(config),
        };

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: RoomRegistry::with_factory(factory),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(PhantasiaServer { transport, state })
    }
}

impl Default for PhantasiaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Phantasia server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PhantasiaServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl PhantasiaServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> PhantasiaServerBuilder {
        PhantasiaServerBuilder::new()
    }
}

impl<C: Codec> PhantasiaServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection gets its own handler task; one failing
    /// connection never affects another.
    pub async fn run(mut self) -> Result<(), PhantasiaError> {
        tracing::info!("Phantasia server running");

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

/// Reads a [`GameConfig`] from a JSON file. Missing fields keep their
/// defaults.
pub fn load_game_config(path: &Path) -> Result<GameConfig, PhantasiaError> {
    let config_error = |reason: String| PhantasiaError::Config {
        path: path.display().to_string(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let config: GameConfig =
        serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
