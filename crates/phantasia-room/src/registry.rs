//! Room registry: creates, finds, and destroys rooms by name.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use phantasia_protocol::{Action, PlayerId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;

use crate::actor::{JoinRefused, spawn_room};
use crate::{GameConfig, JoinReceipt, Outcome, RoomError, RoomHandle, Subscriber, room_key};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Produces a running room for a display name.
///
/// The registry calls this whenever a join names a room that does not
/// exist yet. Swap it out to control how rooms are backed, e.g. with
/// seeded dice in tests.
pub trait RoomFactory: Send + Sync + 'static {
    fn spawn(&self, display_name: &str) -> RoomHandle;
}

/// The default factory: one actor per room, with its own `StdRng`.
pub struct ActorFactory {
    config: Arc<GameConfig>,
    channel_size: usize,
    seed: Option<u64>,
    spawned: AtomicU64,
}

impl ActorFactory {
    /// Rooms roll on OS-seeded dice.
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self {
            config,
            channel_size: DEFAULT_CHANNEL_SIZE,
            seed: None,
            spawned: AtomicU64::new(0),
        }
    }

    /// Rooms roll on dice seeded from `seed`; the n-th room created gets
    /// `seed + n`, so runs are reproducible.
    pub fn seeded(config: Arc<GameConfig>, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new(config)
        }
    }
}

impl RoomFactory for ActorFactory {
    fn spawn(&self, display_name: &str) -> RoomHandle {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_os_rng(),
        };
        spawn_room(
            display_name,
            Arc::clone(&self.config),
            Box::new(rng),
            self.channel_size,
        )
    }
}

/// How many times a join chases a room that closed under it.
const JOIN_ATTEMPTS: usize = 4;

/// All live rooms, keyed by lowercase name.
///
/// A room is in the registry while it has players: it is created by the
/// first join and removed by the leave that empties it. The map sits
/// behind its own lock, held only to look up, insert, or remove a handle,
/// never across a room's reply. A room that empties refuses further
/// joins, so a join racing the last leave lands in a fresh room instead.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    factory: Box<dyn RoomFactory>,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms use `config`.
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] if the config cannot run a room.
    pub fn new(config: GameConfig) -> Result<Self, RoomError> {
        config.validate()?;
        Ok(Self::with_factory(ActorFactory::new(Arc::new(config))))
    }

    /// Creates an empty registry backed by a custom factory.
    pub fn with_factory(factory: impl RoomFactory) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    /// Returns the room for `name`, spawning it if needed. `name` keeps
    /// its case as the display name of a new room.
    pub async fn get_or_create(&self, name: &str) -> RoomHandle {
        let key = room_key(name);
        let mut rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.get(&key) {
            return handle.clone();
        }
        let handle = self.factory.spawn(name.trim());
        tracing::info!(room = %key, display_name = %handle.display_name(), "room created");
        rooms.insert(key, handle.clone());
        handle
    }

    /// Looks a room up by name, ignoring case and surrounding whitespace.
    pub async fn get(&self, name: &str) -> Option<RoomHandle> {
        self.rooms.lock().await.get(&room_key(name)).cloned()
    }

    /// Deletes a room and stops its actor. Returns whether it existed.
    pub async fn remove(&self, name: &str) -> bool {
        let key = room_key(name);
        let removed = self.rooms.lock().await.remove(&key);
        let Some(handle) = removed else {
            return false;
        };
        let _ = handle.shutdown().await;
        tracing::info!(room = %key, "room destroyed");
        true
    }

    /// Unregisters `handle` if it is still the room under its key, and
    /// stops it either way.
    async fn retire(&self, handle: &RoomHandle) {
        let removed = {
            let mut rooms = self.rooms.lock().await;
            match rooms.get(handle.key()) {
                Some(current) if current.same_room(handle) => rooms.remove(handle.key()).is_some(),
                _ => false,
            }
        };
        let _ = handle.shutdown().await;
        if removed {
            tracing::info!(room = %handle.key(), "room destroyed");
        }
    }

    /// Gets or creates the room and adds a player to it.
    ///
    /// A room that is closing hands the subscriber back; the stale entry
    /// is dropped and the join retried on a new room.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] for a duplicate id
    /// - [`RoomError::Unavailable`] if no live room could be reached
    pub async fn join(
        &self,
        room_name: &str,
        player_id: PlayerId,
        player_name: &str,
        subscriber: Box<dyn Subscriber>,
    ) -> Result<JoinReceipt, RoomError> {
        let mut subscriber = subscriber;
        for attempt in 1..=JOIN_ATTEMPTS {
            let handle = self.get_or_create(room_name).await;
            match handle
                .try_join(player_id.clone(), player_name.to_owned(), subscriber)
                .await
            {
                Ok(receipt) => return Ok(receipt),
                Err(JoinRefused::Closing(returned)) => {
                    tracing::debug!(room = %handle.key(), attempt, "room closing, retrying join");
                    self.retire(&handle).await;
                    subscriber = returned;
                }
                Err(JoinRefused::Failed(err)) => {
                    if matches!(err, RoomError::Unavailable(_)) {
                        self.retire(&handle).await;
                    }
                    return Err(err);
                }
            }
        }
        Err(RoomError::Unavailable(room_key(room_name)))
    }

    /// Removes a player from a room. When that empties the room, the room
    /// is destroyed instead of broadcasting. Returns how many remain.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if no such room exists
    /// - [`RoomError::Unavailable`] if its actor has stopped (the stale
    ///   entry is removed)
    pub async fn leave(&self, room_name: &str, player_id: PlayerId) -> Result<usize, RoomError> {
        let key = room_key(room_name);
        let handle = self
            .get(&key)
            .await
            .ok_or_else(|| RoomError::NotFound(key.clone()))?;

        let remaining = match handle.leave(player_id).await {
            Ok(n) => n,
            Err(err) => {
                self.retire(&handle).await;
                return Err(err);
            }
        };
        if remaining == 0 {
            self.retire(&handle).await;
        }
        Ok(remaining)
    }

    /// Submits an action to a room by name. The registry lock is released
    /// before the room is asked.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no such room exists.
    pub async fn submit(
        &self,
        room_name: &str,
        player_id: PlayerId,
        action: Action,
    ) -> Result<Outcome, RoomError> {
        let handle = self
            .get(room_name)
            .await
            .ok_or_else(|| RoomError::NotFound(room_key(room_name)))?;
        handle.act(player_id, action).await
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}
