//! Action resolution: the combat rules.
//!
//! [`ActionResolver`] applies one [`Action`] to a [`Room`] to completion:
//! damage, defeat and rewards, level-ups, the enemy's counter-turn, and a
//! full party wipe. Preconditions that fail (dead player, no mana, no
//! encounter, ...) are not errors. They leave the room untouched and come
//! back as [`Outcome::Ignored`].

use std::fmt;

use phantasia_protocol::{Action, PlayerId};

use crate::encounter::is_boss_encounter;
use crate::{Dice, Enemy, GameConfig, Room};

/// What happened to a submitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action changed the room.
    Applied,
    /// A precondition failed; the room is unchanged.
    Ignored(IgnoreReason),
}

/// Why an action was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownPlayer,
    PlayerDown,
    /// Combat actions need an active encounter.
    NoEncounter,
    /// `next` while an enemy still stands.
    EncounterActive,
    NotEnoughMana,
    NoPotions,
    FullHealth,
    /// The command name was not recognized.
    UnknownAction,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownPlayer => "unknown player",
            Self::PlayerDown => "player is down",
            Self::NoEncounter => "no active encounter",
            Self::EncounterActive => "encounter still active",
            Self::NotEnoughMana => "not enough mana",
            Self::NoPotions => "no potions left",
            Self::FullHealth => "already at full health",
            Self::UnknownAction => "unknown action",
        };
        f.write_str(text)
    }
}

/// Applies actions and spawns encounters using one set of tuning values
/// and one source of randomness.
pub struct ActionResolver<'a> {
    config: &'a GameConfig,
    dice: &'a mut dyn Dice,
}

impl<'a> ActionResolver<'a> {
    pub fn new(config: &'a GameConfig, dice: &'a mut dyn Dice) -> Self {
        Self { config, dice }
    }

    /// Resolves `action` for `player_id` against `room`.
    ///
    /// Attack and spell hit the enemy; the enemy answers only if it
    /// survives. Potion and rest always draw a counter-turn while an
    /// encounter is active. `next` needs an empty encounter slot: it
    /// patches up every player and spawns the next enemy. Unknown
    /// commands change nothing.
    pub fn resolve(&mut self, room: &mut Room, player_id: &PlayerId, action: Action) -> Outcome {
        let Some(index) = room.players.iter().position(|p| p.id == *player_id) else {
            return Outcome::Ignored(IgnoreReason::UnknownPlayer);
        };
        if !room.players[index].alive {
            return Outcome::Ignored(IgnoreReason::PlayerDown);
        }
        if room.enemy.is_none() && action != Action::Next {
            return Outcome::Ignored(IgnoreReason::NoEncounter);
        }

        match action {
            Action::Unknown => return Outcome::Ignored(IgnoreReason::UnknownAction),
            Action::Attack => {
                let player = &room.players[index];
                let damage = self.dice.roll(player.attack_min, player.attack_max);
                self.strike(room, index, damage, "slashes");
                self.enemy_turn(room);
            }
            Action::Spell => {
                let player = &mut room.players[index];
                if !player.spend_mana(self.config.spell_cost) {
                    return Outcome::Ignored(IgnoreReason::NotEnoughMana);
                }
                let bonus = self.config.spell_bonus;
                let damage = self.dice.roll(
                    player.attack_max.saturating_add(bonus.min),
                    player.attack_max.saturating_add(bonus.max),
                );
                self.strike(room, index, damage, "casts arcane blast on");
                self.enemy_turn(room);
            }
            Action::Potion => {
                let player = &mut room.players[index];
                if player.potions == 0 {
                    return Outcome::Ignored(IgnoreReason::NoPotions);
                }
                if player.hp >= player.max_hp {
                    return Outcome::Ignored(IgnoreReason::FullHealth);
                }
                player.potions -= 1;
                let heal = self.dice.roll_range(self.config.potion_heal);
                player.heal(heal);
                let line = format!("{} drinks a potion and restores {heal} HP.", player.name);
                room.add_log(line);
                self.enemy_turn(room);
            }
            Action::Rest => {
                let player = &mut room.players[index];
                let mana = self.dice.roll_range(self.config.rest_mana);
                player.restore_mana(mana);
                let line = format!("{} regains {mana} mana.", player.name);
                room.add_log(line);
                self.enemy_turn(room);
            }
            Action::Next => {
                if room.enemy.is_some() {
                    return Outcome::Ignored(IgnoreReason::EncounterActive);
                }
                for player in &mut room.players {
                    let hp = self.dice.roll_range(self.config.advance_hp);
                    let mana = self.dice.roll_range(self.config.advance_mana);
                    player.heal(hp);
                    player.restore_mana(mana);
                    if player.hp > 0 {
                        player.alive = true;
                    }
                }
                self.spawn_enemy(room);
            }
        }

        Outcome::Applied
    }

    /// Starts the next encounter if none is active. Returns whether one
    /// was spawned.
    pub fn spawn_enemy(&mut self, room: &mut Room) -> bool {
        if room.enemy.is_some() {
            return false;
        }
        let encounter = room.encounter.saturating_add(1);
        let boss = is_boss_encounter(encounter, self.config.boss_every);
        let Some(template) = self.config.bestiary.choose(boss, &mut *self.dice) else {
            tracing::warn!(room = %room.key, boss, "bestiary pool is empty, no enemy spawned");
            return false;
        };

        let enemy = Enemy::scaled(template, encounter, boss, self.config.scale_step);
        let kind = if boss { "Boss" } else { "Enemy" };
        tracing::info!(
            room = %room.key,
            encounter,
            enemy = %enemy.name,
            boss,
            "encounter spawned"
        );
        room.add_log(format!("{kind} encounter #{encounter}: {} appears!", enemy.name));
        room.encounter = encounter;
        room.enemy = Some(enemy);
        true
    }

    fn strike(&mut self, room: &mut Room, attacker: usize, damage: u32, verb: &str) {
        let Some(enemy) = room.enemy.as_mut() else {
            return;
        };
        let defeated = enemy.take_damage(damage);
        let line = format!(
            "{} {verb} {} for {damage}.",
            room.players[attacker].name, enemy.name
        );
        room.add_log(line);

        if defeated {
            self.reward_party(room);
        }
    }

    /// Clears the defeated enemy and pays out every player in the room,
    /// living or not.
    fn reward_party(&mut self, room: &mut Room) {
        let Some(enemy) = room.enemy.take() else {
            return;
        };
        room.add_log(format!("{} is defeated!", enemy.name));

        let party = u32::try_from(room.players.len()).unwrap_or(u32::MAX).max(1);
        let share = (enemy.gold / party).max(self.config.min_gold_share);
        let xp = self.config.kill_xp(enemy.boss);

        let mut lines = Vec::new();
        for player in &mut room.players {
            player.gold = player.gold.saturating_add(share);
            if self.dice.chance(self.config.potion_drop_chance) {
                player.potions = player.potions.saturating_add(1);
            }
            for up in player.gain_xp(xp, self.config) {
                lines.push(format!("{} reached level {}!", player.name, up.level));
            }
        }
        for line in lines {
            room.add_log(line);
        }

        tracing::info!(
            room = %room.key,
            encounter = room.encounter,
            enemy = %enemy.name,
            gold = share,
            xp,
            "enemy defeated"
        );
    }

    /// The enemy hits one living player at random. No-op without an enemy
    /// or without anyone alive.
    fn enemy_turn(&mut self, room: &mut Room) {
        let Some(enemy) = room.enemy.as_ref() else {
            return;
        };
        let living: Vec<usize> = room
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alive)
            .map(|(i, _)| i)
            .collect();
        let Some(last) = living.len().checked_sub(1) else {
            return;
        };

        let pick = self.dice.roll(0, u32::try_from(last).unwrap_or(u32::MAX)) as usize;
        let Some(&target) = living.get(pick) else {
            return;
        };
        let damage = self.dice.roll(enemy.attack_min, enemy.attack_max);
        let enemy_name = enemy.name.clone();

        let player = &mut room.players[target];
        let fell = player.take_damage(damage);
        let name = player.name.clone();

        room.add_log(format!("{enemy_name} strikes {name} for {damage}."));
        if fell {
            room.add_log(format!("{name} has fallen!"));
        }
        if room.all_down() {
            self.wipe(room);
        }
    }

    /// Everyone is down: reset the expedition and charge the penalty.
    fn wipe(&mut self, room: &mut Room) {
        room.add_log("The party was defeated. A fresh expedition begins.");
        room.enemy = None;
        room.encounter = 0;
        for player in &mut room.players {
            player.restore_fully();
            player.gold = player.gold.saturating_sub(self.config.wipe_gold_penalty);
        }
        tracing::info!(room = %room.key, players = room.players.len(), "party wiped");
    }
}
