//! Per-connection handler: subscribe, submit actions, push room events.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The loop waits on two sources at once:
//!   - frames from the client (`join` or `action` commands)
//!   - events the connection's room pushed into its subscriber channel
//!
//! A connection joins at most one room, but may submit actions to any
//! room by name and player id.

use std::sync::Arc;
use std::time::Duration;

use phantasia_protocol::{Ack, ClientMessage, Codec, Failure, PlayerId, ProtocolError, ServerMessage};
use phantasia_room::{
    DEFAULT_NAME, DEFAULT_ROOM, RoomError, generate_player_id, normalize_label, room_key,
};
use phantasia_transport::{Connection, TransportError, WebSocketConnection};
use tokio::sync::mpsc;

use crate::PhantasiaError;
use crate::server::ServerState;

/// Events a joined connection may fall behind by before its room drops it.
const SUBSCRIBER_QUEUE: usize = 256;

/// Drop guard that takes a joined player out of their room when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler returns early with an
/// error. Since `Drop` is synchronous, the async leave runs in a spawned
/// task.
struct Membership<C: Codec> {
    room: String,
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for Membership<C> {
    fn drop(&mut self) {
        let room = std::mem::take(&mut self.room);
        let player_id = std::mem::take(&mut self.player_id);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match state.rooms.leave(&room, player_id.clone()).await {
                Ok(remaining) => {
                    tracing::debug!(%room, %player_id, remaining, "membership released");
                }
                Err(e) => {
                    tracing::debug!(%room, %player_id, error = %e, "leave on disconnect failed");
                }
            }
        });
    }
}

/// What the client side of the loop produced.
enum Inbound {
    Frame(Vec<u8>),
    Closed,
    TimedOut,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), PhantasiaError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    // The sender half goes to the room on join; until then it stays here
    // so `events.recv()` simply pends.
    let (tx, mut events) = mpsc::channel::<ServerMessage>(SUBSCRIBER_QUEUE);
    let mut sink = Some(tx);
    let mut membership: Option<Membership<C>> = None;

    loop {
        let idle = if membership.is_none() { state.idle_timeout } else { None };

        tokio::select! {
            inbound = next_inbound(&conn, idle) => {
                let data = match inbound? {
                    Inbound::Frame(data) => data,
                    Inbound::Closed => {
                        tracing::debug!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Inbound::TimedOut => {
                        tracing::info!(%conn_id, "idle connection timed out");
                        let _ = conn.close().await;
                        break;
                    }
                };

                let msg: ClientMessage = match state.codec.decode(&data) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "malformed frame");
                        let text = match e {
                            ProtocolError::FrameTooLarge { .. } => "Payload too large",
                            _ => "Invalid JSON payload",
                        };
                        send(&conn, &state.codec, &ServerMessage::error(Failure::BAD_REQUEST, text))
                            .await?;
                        continue;
                    }
                };

                match msg {
                    ClientMessage::Join { room, name } => {
                        let Some(tx) = sink.take() else {
                            let reply = ServerMessage::error(Failure::CONFLICT, "Already joined a room");
                            send(&conn, &state.codec, &reply).await?;
                            continue;
                        };
                        let room = normalize_label(room.as_deref(), DEFAULT_ROOM);
                        let name = normalize_label(name.as_deref(), DEFAULT_NAME);
                        let player_id = generate_player_id();

                        let joined = state.rooms.join(&room, player_id, &name, Box::new(tx)).await;
                        match joined {
                            Ok(receipt) => {
                                tracing::info!(
                                    %conn_id,
                                    room = %receipt.room,
                                    player_id = %receipt.player_id,
                                    "connection subscribed"
                                );
                                membership = Some(Membership {
                                    room: room_key(&receipt.room),
                                    player_id: receipt.player_id,
                                    state: Arc::clone(&state),
                                });
                            }
                            Err(e) => {
                                // The sink went to the failed room; start over.
                                let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE);
                                sink = Some(tx);
                                events = rx;
                                send(&conn, &state.codec, &room_failure(&e)).await?;
                            }
                        }
                    }
                    ClientMessage::Action { room, player_id, action } => {
                        let result = state.rooms.submit(&room, player_id, action).await;
                        let reply = match result {
                            Ok(_) => ServerMessage::Ack(Ack::default()),
                            Err(e) => {
                                tracing::debug!(%conn_id, error = %e, "action rejected");
                                room_failure(&e)
                            }
                        };
                        send(&conn, &state.codec, &reply).await?;
                    }
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    // The room dropped this sink: the client stopped keeping up.
                    tracing::warn!(%conn_id, "subscriber fell behind, closing connection");
                    let _ = conn.close().await;
                    break;
                };
                send(&conn, &state.codec, &event).await?;
            }
        }
    }

    // membership drops here → the player leaves their room.
    Ok(())
}

/// Waits for the next client frame, optionally bounded by `idle`.
async fn next_inbound(
    conn: &WebSocketConnection,
    idle: Option<Duration>,
) -> Result<Inbound, TransportError> {
    let received = match idle {
        Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
            Ok(received) => received,
            Err(_) => return Ok(Inbound::TimedOut),
        },
        None => conn.recv().await,
    };
    Ok(match received? {
        Some(data) => Inbound::Frame(data),
        None => Inbound::Closed,
    })
}

/// Maps a room error to the failure the client sees.
fn room_failure(err: &RoomError) -> ServerMessage {
    match err {
        RoomError::NotFound(_) | RoomError::Unavailable(_) => {
            ServerMessage::error(Failure::NOT_FOUND, "Room not found")
        }
        RoomError::AlreadyInRoom(..) => ServerMessage::error(Failure::CONFLICT, err.to_string()),
        RoomError::InvalidConfig(_) => ServerMessage::error(Failure::BAD_REQUEST, err.to_string()),
    }
}

/// Encodes and sends one server message.
async fn send<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    msg: &ServerMessage,
) -> Result<(), PhantasiaError> {
    let text = codec.encode(msg)?;
    conn.send(&text).await?;
    Ok(())
}
