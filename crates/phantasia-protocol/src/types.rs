//! Wire types for the Phantasia protocol.
//!
//! Everything in this module travels as JSON text frames. Clients send
//! [`ClientMessage`]s; the server answers with [`ServerMessage`]s, the
//! most frequent of which is the `state` event carrying a
//! [`RoomSnapshot`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier for a player, unique per connection.
///
/// The server mints these (32 lowercase hex characters) when a connection
/// subscribes to a room and hands them back in the `hello` event. Clients
/// echo them on every action. `#[serde(transparent)]` keeps the JSON form
/// a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Borrows the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A combat command a player can submit against their room.
///
/// Any other name (or a missing one) decodes as [`Action::Unknown`],
/// which rooms accept and ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Weapon strike for `attackMin..=attackMax`.
    Attack,
    /// Arcane blast; costs mana, hits harder than an attack.
    Spell,
    /// Drink a potion to restore hp.
    Potion,
    /// Recover some mana.
    Rest,
    /// Advance to the next encounter once the current one is cleared.
    Next,
    /// Unrecognized command name.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attack => "attack",
            Self::Spell => "spell",
            Self::Potion => "potion",
            Self::Rest => "rest",
            Self::Next => "next",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// Internally tagged, so a join looks like
/// `{"type":"join","room":"Dragons","name":"Ayla"}` and an action like
/// `{"type":"action","room":"dragons","playerId":"…","action":"attack"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Subscribe to a room's live state, creating the room and a player.
    /// Missing or blank fields fall back to the server defaults.
    Join {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },

    /// Submit a combat action for a player in a room. The room is looked
    /// up case-insensitively; the connection sending this need not be the
    /// one that joined.
    Action {
        #[serde(default)]
        room: String,
        #[serde(rename = "playerId", default)]
        player_id: PlayerId,
        #[serde(default)]
        action: Action,
    },
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Messages the server sends to a client.
///
/// Adjacently tagged, mirroring named server-sent events:
/// `{"event":"state","data":{…}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    /// First event on a subscription: who you are and where.
    Hello(Hello),
    /// Full public view of a room after any change.
    State(RoomSnapshot),
    /// An action was accepted (it may still have been a no-op).
    Ack(Ack),
    /// A request was rejected.
    Error(Failure),
}

/// Payload of the `hello` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub player_id: PlayerId,
    pub room: String,
}

/// Payload of the `ack` event. Always `{"ok": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Default for Ack {
    fn default() -> Self {
        Self { ok: true }
    }
}

/// Payload of the `error` event.
///
/// `code` follows HTTP conventions: 400 malformed input, 404 unknown
/// room, 409 conflicting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub ok: bool,
    pub code: u16,
    pub error: String,
}

impl Failure {
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;

    /// Builds a failure payload with `ok: false`.
    pub fn new(code: u16, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            code,
            error: error.into(),
        }
    }
}

impl ServerMessage {
    /// Shorthand for `ServerMessage::Error(Failure::new(..))`.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error(Failure::new(code, message))
    }
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// Immutable public view of a room, pushed to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Display name of the room (case as first typed).
    pub room: String,
    /// 1-indexed encounter counter; 0 before the first spawn or after a wipe.
    pub encounter: u32,
    /// The active enemy, or `null` between encounters.
    pub enemy: Option<EnemyView>,
    /// Players in join order.
    pub players: Vec<PlayerView>,
    /// Newest-first log lines, already trimmed for the wire.
    pub log: Vec<String>,
}

/// Public view of the active enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub attack_min: u32,
    pub attack_max: u32,
    pub gold: u32,
    pub boss: bool,
}

/// Public view of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub gold: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub attack_min: u32,
    pub attack_max: u32,
    pub potions: u32,
    pub alive: bool,
}

// =========================================================================
// Tests
// =========================================================================
