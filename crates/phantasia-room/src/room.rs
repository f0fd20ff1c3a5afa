//! The room aggregate: roster, encounter, and the bounded event log.
//!
//! A [`Room`] is plain data. It is owned by exactly one room actor, which
//! is what serializes mutation; nothing here locks.

use std::collections::VecDeque;

use phantasia_protocol::{PlayerId, RoomSnapshot};

use crate::{Enemy, GameConfig, Player, RoomError};

/// Room used when a join names none.
pub const DEFAULT_ROOM: &str = "global";

/// Player name used when a join names none.
pub const DEFAULT_NAME: &str = "Adventurer";

/// Longest room or player name kept, in characters.
pub const MAX_LABEL_CHARS: usize = 24;

/// Trims `raw` and cuts it to [`MAX_LABEL_CHARS`] characters, falling
/// back to `default` when nothing is left.
///
/// ```rust
/// use phantasia_room::{normalize_label, DEFAULT_ROOM};
///
/// assert_eq!(normalize_label(Some("  Dragons "), DEFAULT_ROOM), "Dragons");
/// assert_eq!(normalize_label(Some("   "), DEFAULT_ROOM), "global");
/// assert_eq!(normalize_label(None, DEFAULT_ROOM), "global");
/// ```
pub fn normalize_label(raw: Option<&str>, default: &str) -> String {
    let cut: String = raw
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_LABEL_CHARS)
        .collect();
    if cut.is_empty() { default.to_owned() } else { cut }
}

/// Registry key for a room name: trimmed and lowercased.
pub fn room_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One shared combat session.
#[derive(Debug, Clone)]
pub struct Room {
    pub(crate) key: String,
    pub(crate) display_name: String,
    /// Join order.
    pub(crate) players: Vec<Player>,
    pub(crate) encounter: u32,
    pub(crate) enemy: Option<Enemy>,
    /// Newest first.
    pub(crate) log: VecDeque<String>,
    log_capacity: usize,
}

impl Room {
    /// Creates an empty room and writes its opening log line.
    pub fn new(display_name: impl Into<String>, log_capacity: usize) -> Self {
        let display_name = display_name.into();
        let mut room = Self {
            key: room_key(&display_name),
            display_name,
            players: Vec::new(),
            encounter: 0,
            enemy: None,
            log: VecDeque::with_capacity(log_capacity.max(1)),
            log_capacity: log_capacity.max(1),
        };
        room.add_log("A new party gathers. Join and prepare for battle.");
        room
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn encounter(&self) -> u32 {
        self.encounter
    }

    pub fn enemy(&self) -> Option<&Enemy> {
        self.enemy.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Newest-first log lines.
    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Prepends a line, dropping the oldest once over capacity.
    pub fn add_log(&mut self, line: impl Into<String>) {
        self.log.push_front(line.into());
        self.log.truncate(self.log_capacity);
    }

    /// Adds a new player with starting stats and logs the arrival.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the id is already on the roster.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        config: &GameConfig,
    ) -> Result<(), RoomError> {
        if self.player(&id).is_some() {
            return Err(RoomError::AlreadyInRoom(id, self.key.clone()));
        }
        let player = Player::new(id, name, config);
        let line = format!("{} joined {}.", player.name, self.display_name);
        self.players.push(player);
        self.add_log(line);
        Ok(())
    }

    /// Removes a player and logs the departure. `None` if they were not
    /// here, in which case nothing is logged.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == *id)?;
        let player = self.players.remove(index);
        self.add_log(format!("{} left the realm.", player.name));
        Some(player)
    }

    /// `true` when nobody on the roster is alive. Vacuously true for an
    /// empty room.
    pub fn all_down(&self) -> bool {
        self.players.iter().all(|p| !p.alive)
    }

    /// Public view with the newest `log_len` lines.
    pub fn snapshot(&self, log_len: usize) -> RoomSnapshot {
        RoomSnapshot {
            room: self.display_name.clone(),
            encounter: self.encounter,
            enemy: self.enemy.as_ref().map(Enemy::view),
            players: self.players.iter().map(Player::view).collect(),
            log: self.log.iter().take(log_len).cloned().collect(),
        }
    }
}
