//! Per-room subscriber set.
//!
//! A subscriber is anything that can take a [`ServerMessage`] without
//! blocking. The room actor pushes one snapshot to every sink after each
//! change; a sink that reports itself gone is dropped on the spot and the
//! rest still receive the message. A bounded channel whose queue is full
//! counts as gone, so a reader that stalls never holds up its room.

use std::collections::HashMap;

use phantasia_protocol::{PlayerId, ServerMessage};
use tokio::sync::mpsc;

/// The receiving side of a subscription has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("subscriber is gone")]
pub struct SubscriberGone;

/// A non-blocking sink for server events.
pub trait Subscriber: Send + Sync + 'static {
    /// Hands over one message. Must not block or await.
    ///
    /// # Errors
    /// [`SubscriberGone`] once the sink can no longer deliver.
    fn push(&self, msg: ServerMessage) -> Result<(), SubscriberGone>;

    /// Called once when the sink is unregistered.
    fn close(&self) {}
}

impl Subscriber for mpsc::Sender<ServerMessage> {
    fn push(&self, msg: ServerMessage) -> Result<(), SubscriberGone> {
        self.try_send(msg).map_err(|_| SubscriberGone)
    }
}

/// Active sinks of one room, keyed by player.
#[derive(Default)]
pub struct Subscribers {
    sinks: HashMap<PlayerId, Box<dyn Subscriber>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the sink for a player.
    pub fn insert(&mut self, player_id: PlayerId, sink: Box<dyn Subscriber>) {
        if let Some(old) = self.sinks.insert(player_id, sink) {
            old.close();
        }
    }

    /// Unregisters a player's sink. Returns whether one was present;
    /// removing a missing sink is not an error.
    pub fn remove(&mut self, player_id: &PlayerId) -> bool {
        match self.sinks.remove(player_id) {
            Some(sink) => {
                sink.close();
                true
            }
            None => false,
        }
    }

    /// Pushes a clone of `msg` to every sink and returns how many took
    /// it. Sinks that fail are pruned.
    pub fn broadcast(&mut self, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        self.sinks.retain(|player_id, sink| match sink.push(msg.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(SubscriberGone) => {
                tracing::debug!(%player_id, "dropping closed subscriber");
                false
            }
        });
        delivered
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
