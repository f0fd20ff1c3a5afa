//! Rooms, encounters, and combat for Phantasia.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, its current enemy, and its log. Actions against one room are
//! applied strictly one after another; different rooms run side by side.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms on first join, destroys them when the
//!   last player leaves
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`ActionResolver`]: the combat rules, applied to a plain [`Room`]
//! - [`Subscribers`]: per-room broadcast set of [`Subscriber`] sinks
//! - [`GameConfig`]: every tuning number, with the live game's defaults
//! - [`Dice`]: the randomness seam ([`ScriptedDice`] for exact tests)

mod actor;
mod broadcast;
mod combat;
mod config;
mod dice;
mod encounter;
mod error;
mod player;
mod registry;
mod room;

pub use actor::{JoinReceipt, RoomHandle, spawn_room};
pub use broadcast::{Subscriber, SubscriberGone, Subscribers};
pub use combat::{ActionResolver, IgnoreReason, Outcome};
pub use config::{GameConfig, RollRange};
pub use dice::{Dice, ScriptedDice};
pub use encounter::{Bestiary, Enemy, EnemyTemplate, is_boss_encounter, scale_factor};
pub use error::RoomError;
pub use player::{LevelUp, Player, generate_player_id, level_up};
pub use registry::{ActorFactory, RoomFactory, RoomRegistry};
pub use room::{DEFAULT_NAME, DEFAULT_ROOM, MAX_LABEL_CHARS, Room, normalize_label, room_key};
