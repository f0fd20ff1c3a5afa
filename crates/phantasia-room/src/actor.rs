//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel. Commands are handled one at a time to completion, so
//! two actions on the same room never interleave, while different rooms
//! run concurrently.
//!
//! Once the last player leaves, the room is closing: it refuses joins and
//! hands the subscriber back, so the registry can retry against a fresh
//! room. On `Shutdown` it drains what is already queued, then stops.

use std::sync::Arc;

use phantasia_protocol::{Action, Hello, PlayerId, RoomSnapshot, ServerMessage};
use tokio::sync::{mpsc, oneshot};

use crate::{ActionResolver, Dice, GameConfig, Outcome, Room, RoomError, Subscriber, Subscribers};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in each request is the reply channel: the caller
/// sends a command and waits for the answer on it.
pub(crate) enum RoomCommand {
    /// Add a player and register their subscriber.
    Join {
        player_id: PlayerId,
        name: String,
        subscriber: Box<dyn Subscriber>,
        reply: oneshot::Sender<Result<JoinReceipt, JoinRefused>>,
    },

    /// Remove a player and their subscriber. Replies with the number of
    /// players left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<usize>,
    },

    /// Resolve an action and broadcast.
    Act {
        player_id: PlayerId,
        action: Action,
        reply: oneshot::Sender<Outcome>,
    },

    /// Request the current public view.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// Stop accepting commands; finish the queued ones, then exit.
    Shutdown,
}

/// Why a join did not go through.
pub(crate) enum JoinRefused {
    /// The room emptied and is winding down. The subscriber is returned
    /// unused.
    Closing(Box<dyn Subscriber>),
    Failed(RoomError),
}

/// What a successful join hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinReceipt {
    pub player_id: PlayerId,
    /// The room's display name.
    pub room: String,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it is an `mpsc::Sender` plus the room's names. The
/// registry holds one per room; connection handlers clone it to act
/// without holding the registry.
#[derive(Clone)]
pub struct RoomHandle {
    key: String,
    display_name: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Lowercase registry key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name as first typed.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// `true` if both handles point at the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.key.clone())
    }

    /// Adds a player. The subscriber receives `hello` first, then the
    /// room's state.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] for a duplicate id
    /// - [`RoomError::Unavailable`] if the room is closing or stopped
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        subscriber: Box<dyn Subscriber>,
    ) -> Result<JoinReceipt, RoomError> {
        self.try_join(player_id, name.into(), subscriber)
            .await
            .map_err(|refused| match refused {
                JoinRefused::Closing(_) => self.unavailable(),
                JoinRefused::Failed(err) => err,
            })
    }

    /// Like [`join`](Self::join), but a closing room gives the subscriber
    /// back.
    pub(crate) async fn try_join(
        &self,
        player_id: PlayerId,
        name: String,
        subscriber: Box<dyn Subscriber>,
    ) -> Result<JoinReceipt, JoinRefused> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = RoomCommand::Join {
            player_id,
            name,
            subscriber,
            reply: reply_tx,
        };
        if let Err(mpsc::error::SendError(cmd)) = self.sender.send(cmd).await {
            return Err(match cmd {
                RoomCommand::Join { subscriber, .. } => JoinRefused::Closing(subscriber),
                _ => JoinRefused::Failed(self.unavailable()),
            });
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Err(JoinRefused::Failed(self.unavailable())))
    }

    /// Removes a player. Returns how many remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Submits an action. The room broadcasts whether or not it applied.
    pub async fn act(&self, player_id: PlayerId, action: Action) -> Result<Outcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Act {
                player_id,
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Fetches the current public view.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    subscribers: Subscribers,
    config: Arc<GameConfig>,
    dice: Box<dyn Dice>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Set when the last player leaves; joins are refused from then on.
    closing: bool,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.room.key(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    name,
                    subscriber,
                    reply,
                } => {
                    let result = self.handle_join(player_id, name, subscriber);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let remaining = self.handle_leave(&player_id);
                    let _ = reply.send(remaining);
                }
                RoomCommand::Act {
                    player_id,
                    action,
                    reply,
                } => {
                    let outcome = self.handle_act(&player_id, action);
                    let _ = reply.send(outcome);
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.room.key(), "room shutting down");
                    self.closing = true;
                    self.receiver.close();
                }
            }
        }

        tracing::info!(room = %self.room.key(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        subscriber: Box<dyn Subscriber>,
    ) -> Result<JoinReceipt, JoinRefused> {
        if self.closing {
            tracing::debug!(room = %self.room.key(), %player_id, "join refused, room closing");
            return Err(JoinRefused::Closing(subscriber));
        }
        self.room
            .add_player(player_id.clone(), name, &self.config)
            .map_err(JoinRefused::Failed)?;

        let hello = ServerMessage::Hello(Hello {
            player_id: player_id.clone(),
            room: self.room.display_name().to_owned(),
        });
        // A sink that is already gone is simply never registered.
        if subscriber.push(hello).is_ok() {
            self.subscribers.insert(player_id.clone(), subscriber);
        }

        tracing::info!(
            room = %self.room.key(),
            %player_id,
            players = self.room.player_count(),
            subscribers = self.subscribers.len(),
            "player joined"
        );

        if self.room.enemy().is_none() {
            ActionResolver::new(&self.config, &mut *self.dice).spawn_enemy(&mut self.room);
        }
        self.broadcast();

        Ok(JoinReceipt {
            player_id,
            room: self.room.display_name().to_owned(),
        })
    }

    fn handle_leave(&mut self, player_id: &PlayerId) -> usize {
        self.subscribers.remove(player_id);
        if self.room.remove_player(player_id).is_some() {
            tracing::info!(
                room = %self.room.key(),
                %player_id,
                players = self.room.player_count(),
                "player left"
            );
        }

        let remaining = self.room.player_count();
        if remaining > 0 {
            self.broadcast();
        } else {
            self.closing = true;
        }
        remaining
    }

    fn handle_act(&mut self, player_id: &PlayerId, action: Action) -> Outcome {
        let outcome = ActionResolver::new(&self.config, &mut *self.dice).resolve(
            &mut self.room,
            player_id,
            action,
        );

        if let Outcome::Ignored(reason) = outcome {
            tracing::debug!(
                room = %self.room.key(),
                %player_id,
                %action,
                %reason,
                "action ignored"
            );
        }
        self.broadcast();
        outcome
    }

    fn snapshot(&self) -> RoomSnapshot {
        self.room.snapshot(self.config.snapshot_log_len)
    }

    /// Builds the snapshot once and pushes it to every subscriber.
    fn broadcast(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let msg = ServerMessage::State(self.snapshot());
        self.subscribers.broadcast(&msg);
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_room(
    display_name: &str,
    config: Arc<GameConfig>,
    dice: Box<dyn Dice>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let room = Room::new(display_name, config.log_capacity);
    let key = room.key().to_owned();

    let actor = RoomActor {
        room,
        subscribers: Subscribers::new(),
        config,
        dice,
        receiver: rx,
        closing: false,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        key,
        display_name: display_name.to_owned(),
        sender: tx,
    }
}
