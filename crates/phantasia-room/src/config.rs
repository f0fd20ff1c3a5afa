//! Game tuning.
//!
//! Every number the combat rules use lives in [`GameConfig`]. The defaults
//! are the live game's values; tests and alternative deployments override
//! individual fields with struct-update syntax or a partial JSON/TOML
//! document (`#[serde(default)]` fills the rest).

use serde::{Deserialize, Serialize};

use crate::{Bestiary, RoomError};

// ---------------------------------------------------------------------------
// RollRange
// ---------------------------------------------------------------------------

/// An inclusive range for a uniform integer draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRange {
    pub min: u32,
    pub max: u32,
}

impl RollRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Tuning for players, encounters, rewards, actions, and the room log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // -- New characters --
    /// Starting (and initial maximum) hit points.
    pub starting_hp: u32,
    /// Starting (and initial maximum) mana.
    pub starting_mana: u32,
    /// Starting weapon damage range.
    pub starting_attack: RollRange,
    pub starting_potions: u32,
    /// XP needed for the first level-up.
    pub starting_xp_to_next: u32,

    // -- Leveling --
    /// `xp_to_next` is multiplied by this (and floored) on every level-up.
    pub xp_growth: f64,
    pub level_hp_bonus: u32,
    pub level_mana_bonus: u32,
    pub level_attack_min_bonus: u32,
    pub level_attack_max_bonus: u32,

    // -- Encounters --
    /// Every n-th encounter is a boss.
    pub boss_every: u32,
    /// Per-encounter stat growth: `scale = 1 + (encounter - 1) * scale_step`.
    pub scale_step: f64,
    pub bestiary: Bestiary,

    // -- Rewards and penalties --
    pub xp_reward: u32,
    pub boss_xp_reward: u32,
    /// Floor for each player's share of an enemy's gold.
    pub min_gold_share: u32,
    /// Independent per-player chance of a potion drop on a kill.
    pub potion_drop_chance: f64,
    /// Gold each player loses when the whole party falls.
    pub wipe_gold_penalty: u32,

    // -- Actions --
    pub spell_cost: u32,
    /// Spell damage is `attack_max + spell_bonus`.
    pub spell_bonus: RollRange,
    pub potion_heal: RollRange,
    pub rest_mana: RollRange,
    /// Recovery every player gets when the party advances.
    pub advance_hp: RollRange,
    pub advance_mana: RollRange,

    // -- Log --
    /// Lines kept per room, newest first.
    pub log_capacity: usize,
    /// Lines included in each snapshot.
    pub snapshot_log_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_hp: 100,
            starting_mana: 35,
            starting_attack: RollRange::new(8, 14),
            starting_potions: 2,
            starting_xp_to_next: 45,

            xp_growth: 1.35,
            level_hp_bonus: 16,
            level_mana_bonus: 7,
            level_attack_min_bonus: 2,
            level_attack_max_bonus: 3,

            boss_every: 5,
            scale_step: 0.12,
            bestiary: Bestiary::default(),

            xp_reward: 20,
            boss_xp_reward: 45,
            min_gold_share: 3,
            potion_drop_chance: 0.25,
            wipe_gold_penalty: 10,

            spell_cost: 10,
            spell_bonus: RollRange::new(5, 15),
            potion_heal: RollRange::new(20, 36),
            rest_mana: RollRange::new(5, 11),
            advance_hp: RollRange::new(6, 12),
            advance_mana: RollRange::new(4, 8),

            log_capacity: 60,
            snapshot_log_len: 35,
        }
    }
}

impl GameConfig {
    /// Checks the values the room actors rely on.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), RoomError> {
        let invalid = |msg: &str| Err(RoomError::InvalidConfig(msg.to_owned()));

        if self.bestiary.monsters.is_empty() {
            return invalid("bestiary has no regular monsters");
        }
        if self.bestiary.bosses.is_empty() {
            return invalid("bestiary has no bosses");
        }
        if self.boss_every == 0 {
            return invalid("boss_every must be at least 1");
        }
        if self.starting_hp == 0 || self.starting_mana == 0 {
            return invalid("starting hp and mana must be positive");
        }
        if self.starting_xp_to_next == 0 {
            return invalid("starting_xp_to_next must be positive");
        }
        if self.starting_attack.min > self.starting_attack.max {
            return invalid("starting_attack min exceeds max");
        }
        if self.xp_growth.is_nan() || self.xp_growth < 1.0 {
            return invalid("xp_growth must be at least 1.0");
        }
        if self.scale_step.is_nan() || self.scale_step < 0.0 {
            return invalid("scale_step must not be negative");
        }
        if !(0.0..=1.0).contains(&self.potion_drop_chance) {
            return invalid("potion_drop_chance must be within 0.0..=1.0");
        }
        if self.log_capacity == 0 || self.snapshot_log_len > self.log_capacity {
            return invalid("snapshot_log_len must fit within a non-empty log_capacity");
        }
        Ok(())
    }

    /// XP each player earns for defeating an enemy.
    pub fn kill_xp(&self, boss: bool) -> u32 {
        if boss { self.boss_xp_reward } else { self.xp_reward }
    }
}
