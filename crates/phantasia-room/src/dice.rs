//! Random draws for combat.
//!
//! Every roll in the game goes through [`Dice`], so a room can run on a
//! seeded `StdRng` for reproducible sessions or on [`ScriptedDice`] in
//! tests that need exact outcomes.

use std::collections::VecDeque;

use rand::Rng;

use crate::RollRange;

/// Source of uniform integer draws and coin flips.
pub trait Dice: Send {
    /// Uniform integer in `min..=max`. Bounds given in the wrong order are
    /// swapped rather than rejected.
    fn roll(&mut self, min: u32, max: u32) -> u32;

    /// `true` with the given probability (clamped to `0.0..=1.0`).
    fn chance(&mut self, probability: f64) -> bool;

    /// Convenience for rolling a configured range.
    fn roll_range(&mut self, range: RollRange) -> u32 {
        self.roll(range.min, range.max)
    }
}

impl<R: Rng + Send + ?Sized> Dice for R {
    fn roll(&mut self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.random_range(lo..=hi)
    }

    fn chance(&mut self, probability: f64) -> bool {
        if probability.is_nan() {
            return false;
        }
        self.random_bool(probability.clamp(0.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// ScriptedDice
// ---------------------------------------------------------------------------

/// Replays queued outcomes instead of drawing randomly.
///
/// Each `roll` pops the next queued value and clamps it into the requested
/// range, so a script stays valid even when a test gets a range slightly
/// wrong. An exhausted roll queue yields `min`; an exhausted chance queue
/// yields `false`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    chances: VecDeque<bool>,
}

impl ScriptedDice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues integer outcomes, consumed in order.
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = u32>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Queues coin-flip outcomes, consumed in order.
    pub fn with_chances(mut self, chances: impl IntoIterator<Item = bool>) -> Self {
        self.chances.extend(chances);
        self
    }

    /// Number of queued rolls not yet consumed.
    pub fn rolls_left(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rolls.pop_front().map_or(lo, |v| v.clamp(lo, hi))
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }
}
