//! # Phantasia
//!
//! A real-time multiplayer combat server. Clients join a named room over
//! WebSocket, receive the room's live state after every change, and
//! submit combat actions against the room's current enemy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phantasia::PhantasiaServer;
//!
//! # async fn start() -> Result<(), phantasia::PhantasiaError> {
//! let server = PhantasiaServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! println!("listening on {}", server.local_addr().unwrap());
//! server.run().await
//! # }
//! ```
//!
//! ## Wire protocol
//!
//! Text frames of JSON. Clients send
//! `{"type":"join","room":"Dragons","name":"Ayla"}` once to subscribe and
//! `{"type":"action","room":"dragons","playerId":"…","action":"attack"}`
//! to act. The server answers with `hello`, `state`, `ack`, and `error`
//! events; see [`phantasia_protocol`].

mod error;
mod handler;
mod server;

pub use error::PhantasiaError;
pub use server::{PhantasiaServer, PhantasiaServerBuilder, load_game_config};

pub use phantasia_protocol as protocol;
pub use phantasia_room as room;
