//! Integration tests for the room system: registry, actors, broadcast.

use std::sync::Arc;
use std::time::{Duration, Instant};

use phantasia_protocol::{Action, PlayerId, RoomSnapshot, ServerMessage};
use phantasia_room::{
    ActorFactory, Dice, GameConfig, IgnoreReason, Outcome, RoomError, RoomFactory, RoomHandle,
    RoomRegistry, ScriptedDice, room_key, spawn_room,
};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

/// Every room rolls the low end of each range and never wins a coin flip.
struct LowRollFactory(Arc<GameConfig>);

impl RoomFactory for LowRollFactory {
    fn spawn(&self, display_name: &str) -> RoomHandle {
        spawn_room(
            display_name,
            Arc::clone(&self.0),
            Box::new(ScriptedDice::new()),
            16,
        )
    }
}

fn registry() -> RoomRegistry {
    RoomRegistry::with_factory(LowRollFactory(Arc::new(GameConfig::default())))
}

fn pid(s: &str) -> PlayerId {
    PlayerId::from(s)
}

type Inbox = mpsc::Receiver<ServerMessage>;

fn inbox() -> (Box<mpsc::Sender<ServerMessage>>, Inbox) {
    let (tx, rx) = mpsc::channel(64);
    (Box::new(tx), rx)
}

async fn next(rx: &mut Inbox) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a server event")
        .expect("subscriber channel closed")
}

async fn next_state(rx: &mut Inbox) -> RoomSnapshot {
    match next(rx).await {
        ServerMessage::State(snapshot) => snapshot,
        other => panic!("expected state, got {other:?}"),
    }
}

// =========================================================================
// Join / leave
// =========================================================================

#[tokio::test]
async fn test_join_sends_hello_then_state_with_first_encounter() {
    let rooms = registry();
    let (tx, mut rx) = inbox();

    let receipt = rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    assert_eq!(receipt.room, "Dragons");

    match next(&mut rx).await {
        ServerMessage::Hello(hello) => {
            assert_eq!(hello.player_id, pid("a"));
            assert_eq!(hello.room, "Dragons");
        }
        other => panic!("expected hello, got {other:?}"),
    }

    let state = next_state(&mut rx).await;
    assert_eq!(state.room, "Dragons");
    assert_eq!(state.encounter, 1);
    assert_eq!(state.players.len(), 1);
    let enemy = state.enemy.unwrap();
    assert_eq!(enemy.name, "Goblin Raider");
    assert_eq!(enemy.hp, 65);
    assert_eq!(state.log[0], "Enemy encounter #1: Goblin Raider appears!");
    assert_eq!(state.log[1], "Ayla joined Dragons.");
}

#[tokio::test]
async fn test_second_join_reuses_room_and_encounter() {
    let rooms = registry();
    let (tx_a, mut rx_a) = inbox();
    let (tx_b, _rx_b) = inbox();

    rooms.join("Dragons", pid("a"), "Ayla", tx_a).await.unwrap();
    rooms.join("dragons", pid("b"), "Bren", tx_b).await.unwrap();

    assert_eq!(rooms.room_count().await, 1);

    next(&mut rx_a).await; // hello
    next_state(&mut rx_a).await; // own join
    let state = next_state(&mut rx_a).await;
    assert_eq!(state.room, "Dragons");
    assert_eq!(state.encounter, 1);
    let names: Vec<&str> = state.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ayla", "Bren"]);
}

#[tokio::test]
async fn test_leave_broadcasts_while_players_remain() {
    let rooms = registry();
    let (tx_a, mut rx_a) = inbox();
    let (tx_b, _rx_b) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx_a).await.unwrap();
    rooms.join("Dragons", pid("b"), "Bren", tx_b).await.unwrap();

    let remaining = rooms.leave("Dragons", pid("b")).await.unwrap();

    assert_eq!(remaining, 1);
    assert!(rooms.get("dragons").await.is_some());
    next(&mut rx_a).await;
    next_state(&mut rx_a).await;
    next_state(&mut rx_a).await;
    let state = next_state(&mut rx_a).await;
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.log[0], "Bren left the realm.");
}

#[tokio::test]
async fn test_last_leave_destroys_room() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    let handle = rooms.get("Dragons").await.unwrap();

    let remaining = rooms.leave("DRAGONS", pid("a")).await.unwrap();

    assert_eq!(remaining, 0);
    assert_eq!(rooms.room_count().await, 0);
    assert!(rooms.get("Dragons").await.is_none());

    // The actor stops once it processes the shutdown.
    tokio::time::timeout(Duration::from_secs(2), async {
        while !handle.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_remove_stops_room_and_forgets_it() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    let handle = rooms.get("Dragons").await.unwrap();

    assert!(rooms.remove(" DRAGONS ").await);
    assert!(!rooms.remove("dragons").await);
    assert!(rooms.get("dragons").await.is_none());

    let result = rooms.submit("dragons", pid("a"), Action::Attack).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
    tokio::time::timeout(Duration::from_secs(2), async {
        while !handle.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_leave_unknown_room_returns_not_found() {
    let rooms = registry();
    let result = rooms.leave("nowhere", pid("a")).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_rejoin_after_destroy_starts_fresh() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    rooms.submit("Dragons", pid("a"), Action::Attack).await.unwrap();
    rooms.leave("Dragons", pid("a")).await.unwrap();

    let (tx, _rx) = inbox();
    rooms.join("dragons", pid("b"), "Bren", tx).await.unwrap();
    let state = rooms.get("dragons").await.unwrap().snapshot().await.unwrap();

    assert_eq!(state.room, "dragons");
    assert_eq!(state.enemy.unwrap().hp, 65);
    assert_eq!(state.players.len(), 1);
}

#[tokio::test]
async fn test_emptied_room_refuses_direct_join() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    let handle = rooms.get("Dragons").await.unwrap();

    // Leave through the handle so the registry still lists the room.
    assert_eq!(handle.leave(pid("a")).await.unwrap(), 0);

    let (tx, _rx) = inbox();
    let result = handle.join(pid("b"), "Bren", tx).await;
    assert!(matches!(result, Err(RoomError::Unavailable(_))));
}

#[tokio::test]
async fn test_join_racing_last_leave_lands_in_fresh_room() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    let stale = rooms.get("Dragons").await.unwrap();
    assert_eq!(stale.leave(pid("a")).await.unwrap(), 0);

    let (tx, mut rx) = inbox();
    let receipt = rooms.join("dragons", pid("b"), "Bren", tx).await.unwrap();

    assert_eq!(receipt.room, "dragons");
    let fresh = rooms.get("Dragons").await.unwrap();
    assert!(!fresh.same_room(&stale));
    assert_eq!(rooms.room_count().await, 1);

    next(&mut rx).await; // hello
    let state = next_state(&mut rx).await;
    let names: Vec<&str> = state.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bren"]);
    assert!(!state.log.iter().any(|line| line.contains("Ayla")));

    tokio::time::timeout(Duration::from_secs(2), async {
        while !stale.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

// =========================================================================
// Actions
// =========================================================================

#[tokio::test]
async fn test_submit_attack_applies_and_broadcasts() {
    let rooms = registry();
    let (tx, mut rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    next(&mut rx).await;
    next_state(&mut rx).await;

    let outcome = rooms.submit("dragons", pid("a"), Action::Attack).await.unwrap();

    assert_eq!(outcome, Outcome::Applied);
    let state = next_state(&mut rx).await;
    // Low rolls: 8 damage dealt, 6 taken.
    assert_eq!(state.enemy.unwrap().hp, 57);
    assert_eq!(state.players[0].hp, 94);
    assert_eq!(state.log[0], "Goblin Raider strikes Ayla for 6.");
    assert_eq!(state.log[1], "Ayla slashes Goblin Raider for 8.");
}

#[tokio::test]
async fn test_ignored_action_still_broadcasts() {
    let rooms = registry();
    let (tx, mut rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    next(&mut rx).await;
    let before = next_state(&mut rx).await;

    let outcome = rooms.submit("Dragons", pid("a"), Action::Potion).await.unwrap();

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::FullHealth));
    let after = next_state(&mut rx).await;
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_action_from_unknown_player_is_ignored() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();

    let outcome = rooms.submit("Dragons", pid("zz"), Action::Attack).await.unwrap();

    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::UnknownPlayer));
}

#[tokio::test]
async fn test_submit_unknown_room_returns_not_found() {
    let rooms = registry();
    let result = rooms.submit("nowhere", pid("a"), Action::Attack).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_dead_subscriber_does_not_block_others() {
    let rooms = registry();
    let (tx_a, rx_a) = inbox();
    let (tx_b, mut rx_b) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx_a).await.unwrap();
    rooms.join("Dragons", pid("b"), "Bren", tx_b).await.unwrap();
    drop(rx_a);
    next(&mut rx_b).await;
    next_state(&mut rx_b).await;

    rooms.submit("Dragons", pid("b"), Action::Rest).await.unwrap();

    let state = next_state(&mut rx_b).await;
    assert_eq!(state.players.len(), 2);
    assert_eq!(state.log[1], "Bren regains 5 mana.");
}

#[tokio::test]
async fn test_stalled_subscriber_is_dropped_and_room_keeps_going() {
    let rooms = registry();
    // Room for hello and the first state only.
    let (tx_a, mut rx_a) = mpsc::channel(2);
    let (tx_b, mut rx_b) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", Box::new(tx_a)).await.unwrap();
    rooms.join("Dragons", pid("b"), "Bren", tx_b).await.unwrap();
    next(&mut rx_b).await;
    next_state(&mut rx_b).await;

    rooms.submit("Dragons", pid("b"), Action::Rest).await.unwrap();

    let state = next_state(&mut rx_b).await;
    assert_eq!(state.players.len(), 2);
    assert!(matches!(next(&mut rx_a).await, ServerMessage::Hello(_)));
    next_state(&mut rx_a).await;
    let closed = tokio::time::timeout(Duration::from_secs(2), rx_a.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
}

#[tokio::test]
async fn test_rooms_run_independently() {
    let rooms = registry();
    let (tx_a, _rx_a) = inbox();
    let (tx_b, _rx_b) = inbox();
    rooms.join("North", pid("a"), "Ayla", tx_a).await.unwrap();
    rooms.join("South", pid("b"), "Bren", tx_b).await.unwrap();
    let north = rooms.get("north").await.unwrap();
    let south = rooms.get("south").await.unwrap();

    let (left, right) = tokio::join!(
        north.act(pid("a"), Action::Attack),
        south.act(pid("b"), Action::Spell),
    );
    assert_eq!(left.unwrap(), Outcome::Applied);
    assert_eq!(right.unwrap(), Outcome::Applied);

    // Player ids are scoped to their room.
    assert_eq!(
        north.act(pid("b"), Action::Attack).await.unwrap(),
        Outcome::Ignored(IgnoreReason::UnknownPlayer)
    );

    let north = north.snapshot().await.unwrap();
    let south = south.snapshot().await.unwrap();
    assert_eq!(north.enemy.unwrap().hp, 57);
    // Spell: attack_max 14 + 5 = 19 damage.
    assert_eq!(south.enemy.unwrap().hp, 46);
    assert_eq!(south.players[0].mana, 25);
}

#[tokio::test]
async fn test_many_concurrent_actions_are_serialized() {
    let rooms = registry();
    let (tx, _rx) = inbox();
    rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
    let handle = rooms.get("Dragons").await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.act(pid("a"), Action::Rest).await.unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let state = handle.snapshot().await.unwrap();
    // Each rest draws one 6-damage counter-turn.
    assert_eq!(state.players[0].hp, 100 - 10 * 6);
}

/// Blocks the room's task on every draw.
struct SlowDice(Duration);

impl Dice for SlowDice {
    fn roll(&mut self, min: u32, _max: u32) -> u32 {
        std::thread::sleep(self.0);
        min
    }

    fn chance(&mut self, _probability: f64) -> bool {
        false
    }
}

/// Rooms named "slow" roll on [`SlowDice`]; the rest on low scripted rolls.
struct MixedFactory(Arc<GameConfig>);

impl RoomFactory for MixedFactory {
    fn spawn(&self, display_name: &str) -> RoomHandle {
        let dice: Box<dyn Dice> = if room_key(display_name) == "slow" {
            Box::new(SlowDice(Duration::from_millis(500)))
        } else {
            Box::new(ScriptedDice::new())
        };
        spawn_room(display_name, Arc::clone(&self.0), dice, 16)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_busy_room_does_not_stall_other_rooms() {
    let rooms = Arc::new(RoomRegistry::with_factory(MixedFactory(Arc::new(
        GameConfig::default(),
    ))));
    let (tx, _rx) = inbox();
    rooms.join("Fast", pid("a"), "Ayla", tx).await.unwrap();

    let slow_join = {
        let rooms = Arc::clone(&rooms);
        tokio::spawn(async move {
            let (tx, _rx) = inbox();
            rooms.join("Slow", pid("b"), "Bren", tx).await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = Instant::now();
    let outcome = rooms.submit("fast", pid("a"), Action::Rest).await.unwrap();
    let fast_elapsed = started.elapsed();
    let (tx, _rx) = inbox();
    rooms.join("fast", pid("c"), "Cato", tx).await.unwrap();
    rooms.leave("fast", pid("c")).await.unwrap();
    let total_elapsed = started.elapsed();

    assert_eq!(outcome, Outcome::Applied);
    assert!(fast_elapsed < Duration::from_millis(250), "took {fast_elapsed:?}");
    assert!(total_elapsed < Duration::from_millis(250), "took {total_elapsed:?}");
    slow_join.await.unwrap().unwrap();
}

// =========================================================================
// Construction
// =========================================================================

#[tokio::test]
async fn test_registry_rejects_invalid_config() {
    let mut config = GameConfig::default();
    config.bestiary.monsters.clear();
    assert!(matches!(
        RoomRegistry::new(config),
        Err(RoomError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_seeded_factory_is_reproducible() {
    async fn play(seed: u64) -> RoomSnapshot {
        let factory = ActorFactory::seeded(Arc::new(GameConfig::default()), seed);
        let rooms = RoomRegistry::with_factory(factory);
        let (tx, _rx) = inbox();
        rooms.join("Dragons", pid("a"), "Ayla", tx).await.unwrap();
        for action in [Action::Attack, Action::Spell, Action::Attack, Action::Rest] {
            rooms.submit("Dragons", pid("a"), action).await.unwrap();
        }
        rooms.get("Dragons").await.unwrap().snapshot().await.unwrap()
    }

    assert_eq!(play(7).await, play(7).await);
}
