//! Enemies: templates, the bestiary, and per-encounter scaling.

use phantasia_protocol::EnemyView;
use serde::{Deserialize, Serialize};

use crate::Dice;

/// Base stats for an enemy before scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub hp: u32,
    pub attack_min: u32,
    pub attack_max: u32,
    pub gold: u32,
}

impl EnemyTemplate {
    pub fn new(name: &str, hp: u32, attack_min: u32, attack_max: u32, gold: u32) -> Self {
        Self {
            name: name.to_owned(),
            hp,
            attack_min,
            attack_max,
            gold,
        }
    }
}

/// The pools encounters are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bestiary {
    pub monsters: Vec<EnemyTemplate>,
    pub bosses: Vec<EnemyTemplate>,
}

impl Default for Bestiary {
    fn default() -> Self {
        Self {
            monsters: vec![
                EnemyTemplate::new("Goblin Raider", 65, 6, 11, 12),
                EnemyTemplate::new("Warg", 82, 8, 13, 16),
                EnemyTemplate::new("Dark Acolyte", 95, 9, 15, 19),
                EnemyTemplate::new("Cave Troll", 120, 11, 18, 24),
            ],
            bosses: vec![
                EnemyTemplate::new("Ancient Dragon", 190, 15, 24, 80),
                EnemyTemplate::new("The Dark Lord", 230, 18, 28, 110),
            ],
        }
    }
}

impl Bestiary {
    /// Picks a template uniformly from the boss or regular pool.
    /// `None` only if that pool is empty.
    pub fn choose(&self, boss: bool, dice: &mut dyn Dice) -> Option<&EnemyTemplate> {
        let pool = if boss { &self.bosses } else { &self.monsters };
        let last = u32::try_from(pool.len().checked_sub(1)?).unwrap_or(u32::MAX);
        pool.get(dice.roll(0, last) as usize)
    }
}

/// `true` when the 1-indexed encounter number is a boss fight.
pub fn is_boss_encounter(encounter: u32, boss_every: u32) -> bool {
    boss_every != 0 && encounter != 0 && encounter % boss_every == 0
}

/// Stat multiplier for an encounter: `1 + max(0, encounter - 1) * step`.
pub fn scale_factor(encounter: u32, step: f64) -> f64 {
    1.0 + f64::from(encounter.saturating_sub(1)) * step
}

fn scale_stat(base: u32, factor: f64) -> u32 {
    (f64::from(base) * factor).floor() as u32
}

/// The active antagonist of a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub(crate) name: String,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    pub(crate) attack_min: u32,
    pub(crate) attack_max: u32,
    pub(crate) gold: u32,
    pub(crate) boss: bool,
}

impl Enemy {
    /// Scales a template for the given encounter. hp, both attack bounds,
    /// and gold are each floored independently; `hp == max_hp`.
    pub fn scaled(template: &EnemyTemplate, encounter: u32, boss: bool, step: f64) -> Self {
        let factor = scale_factor(encounter, step);
        let hp = scale_stat(template.hp, factor);
        Self {
            name: template.name.clone(),
            hp,
            max_hp: hp,
            attack_min: scale_stat(template.attack_min, factor),
            attack_max: scale_stat(template.attack_max, factor),
            gold: scale_stat(template.gold, factor),
            boss,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn is_boss(&self) -> bool {
        self.boss
    }

    /// Subtracts hp (floored at 0). Returns `true` once hp reaches 0.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }

    pub fn view(&self) -> EnemyView {
        EnemyView {
            name: self.name.clone(),
            hp: self.hp,
            max_hp: self.max_hp,
            attack_min: self.attack_min,
            attack_max: self.attack_max,
            gold: self.gold,
            boss: self.boss,
        }
    }
}
