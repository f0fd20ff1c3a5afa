//! Player characters and the leveling rules.

use phantasia_protocol::{PlayerId, PlayerView};
use rand::Rng;

use crate::GameConfig;

/// Mints a fresh player id: 32 lowercase hex characters (128 random bits).
///
/// Ids double as the only proof of identity when submitting actions, so
/// they must not be guessable from one another.
pub fn generate_player_id() -> PlayerId {
    let bytes: [u8; 16] = rand::rng().random();
    PlayerId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// Emitted once per level gained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    /// The level just reached.
    pub level: u32,
}

/// One connection's character. Owned by its room.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) level: u32,
    pub(crate) xp: u32,
    pub(crate) xp_to_next: u32,
    pub(crate) gold: u32,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    pub(crate) mana: u32,
    pub(crate) max_mana: u32,
    pub(crate) attack_min: u32,
    pub(crate) attack_max: u32,
    pub(crate) potions: u32,
    pub(crate) alive: bool,
}

impl Player {
    /// Creates a level 1 character with the configured starting stats.
    pub fn new(id: PlayerId, name: impl Into<String>, config: &GameConfig) -> Self {
        Self {
            id,
            name: name.into(),
            level: 1,
            xp: 0,
            xp_to_next: config.starting_xp_to_next,
            gold: 0,
            hp: config.starting_hp,
            max_hp: config.starting_hp,
            mana: config.starting_mana,
            max_mana: config.starting_mana,
            attack_min: config.starting_attack.min,
            attack_max: config.starting_attack.max,
            potions: config.starting_potions,
            alive: true,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn mana(&self) -> u32 {
        self.mana
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Subtracts hp (floored at 0). Returns `true` if this blow killed.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    /// Adds hp, capped at `max_hp`. Does not revive.
    pub fn heal(&mut self, amount: u32) {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }

    /// Adds mana, capped at `max_mana`.
    pub fn restore_mana(&mut self, amount: u32) {
        self.mana = self.mana.saturating_add(amount).min(self.max_mana);
    }

    /// Spends mana if there is enough. Returns whether it was spent.
    pub fn spend_mana(&mut self, amount: u32) -> bool {
        if self.mana < amount {
            return false;
        }
        self.mana -= amount;
        true
    }

    /// Full hp and mana, alive again.
    pub fn restore_fully(&mut self) {
        self.hp = self.max_hp;
        self.mana = self.max_mana;
        self.alive = true;
    }

    /// Awards xp and applies every level-up it pays for.
    ///
    /// This is a loop, not a single check: one large award can cross
    /// several thresholds. Each level-up subtracts the threshold, grows it
    /// by `xp_growth` (floored), raises the caps and attack range, refills
    /// hp and mana, and sets `alive`. That last step revives a dead player
    /// who levels from a shared kill reward.
    pub fn gain_xp(&mut self, amount: u32, config: &GameConfig) -> Vec<LevelUp> {
        self.xp = self.xp.saturating_add(amount);

        let mut gained = Vec::new();
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            let grown = (f64::from(self.xp_to_next) * config.xp_growth).floor() as u32;
            self.xp_to_next = grown.max(self.xp_to_next);
            self.max_hp += config.level_hp_bonus;
            self.max_mana += config.level_mana_bonus;
            self.attack_min += config.level_attack_min_bonus;
            self.attack_max += config.level_attack_max_bonus;
            self.restore_fully();
            gained.push(LevelUp { level: self.level });
        }
        gained
    }

    /// Public view for snapshots.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id.clone(),
            name: self.name.clone(),
            level: self.level,
            xp: self.xp,
            xp_to_next: self.xp_to_next,
            gold: self.gold,
            hp: self.hp,
            max_hp: self.max_hp,
            mana: self.mana,
            max_mana: self.max_mana,
            attack_min: self.attack_min,
            attack_max: self.attack_max,
            potions: self.potions,
            alive: self.alive,
        }
    }
}

/// Pure form of [`Player::gain_xp`]: returns the leveled copy and the
/// level-ups, leaving `player` untouched.
pub fn level_up(player: &Player, xp_gain: u32, config: &GameConfig) -> (Player, Vec<LevelUp>) {
    let mut next = player.clone();
    let gained = next.gain_xp(xp_gain, config);
    (next, gained)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Player {
        Player::new(PlayerId::from("p1"), "Ayla", &GameConfig::default())
    }

    #[test]
    fn test_new_player_has_starting_stats() {
        let p = fresh();
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 0);
        assert_eq!(p.xp_to_next, 45);
        assert_eq!((p.hp, p.max_hp), (100, 100));
        assert_eq!((p.mana, p.max_mana), (35, 35));
        assert_eq!((p.attack_min, p.attack_max), (8, 14));
        assert_eq!(p.potions, 2);
        assert_eq!(p.gold, 0);
        assert!(p.alive);
    }

    #[test]
    fn test_generate_player_id_is_32_hex_chars_and_unique() {
        let a = generate_player_id();
        let b = generate_player_id();
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_take_damage_clamps_at_zero_and_marks_dead() {
        let mut p = fresh();
        assert!(!p.take_damage(40));
        assert_eq!(p.hp, 60);
        assert!(p.take_damage(500));
        assert_eq!(p.hp, 0);
        assert!(!p.alive);
        // Already down: no second "fall".
        assert!(!p.take_damage(5));
    }

    #[test]
    fn test_heal_and_mana_cap_at_max() {
        let mut p = fresh();
        p.hp = 90;
        p.heal(36);
        assert_eq!(p.hp, 100);
        p.mana = 30;
        p.restore_mana(11);
        assert_eq!(p.mana, 35);
    }

    #[test]
    fn test_spend_mana_refuses_when_short() {
        let mut p = fresh();
        p.mana = 9;
        assert!(!p.spend_mana(10));
        assert_eq!(p.mana, 9);
        p.mana = 10;
        assert!(p.spend_mana(10));
        assert_eq!(p.mana, 0);
    }

    #[test]
    fn test_gain_xp_below_threshold_does_not_level() {
        let mut p = fresh();
        let ups = p.gain_xp(44, &GameConfig::default());
        assert!(ups.is_empty());
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 44);
    }

    #[test]
    fn test_gain_xp_single_level_applies_bonuses() {
        let mut p = fresh();
        p.hp = 10;
        p.mana = 0;

        let ups = p.gain_xp(50, &GameConfig::default());

        assert_eq!(ups, vec![LevelUp { level: 2 }]);
        assert_eq!(p.xp, 5);
        assert_eq!(p.xp_to_next, 60); // floor(45 * 1.35)
        assert_eq!((p.hp, p.max_hp), (116, 116));
        assert_eq!((p.mana, p.max_mana), (42, 42));
        assert_eq!((p.attack_min, p.attack_max), (10, 17));
    }

    #[test]
    fn test_gain_xp_crossing_two_thresholds_cascades() {
        let mut p = fresh();

        // 45 for level 2, then 60 for level 3, 5 left over.
        let ups = p.gain_xp(110, &GameConfig::default());

        assert_eq!(ups, vec![LevelUp { level: 2 }, LevelUp { level: 3 }]);
        assert_eq!(p.level, 3);
        assert_eq!(p.xp, 5);
        assert_eq!(p.xp_to_next, 81); // floor(60 * 1.35)
        assert_eq!(p.max_hp, 132);
    }

    #[test]
    fn test_gain_xp_threshold_never_decreases() {
        let mut p = fresh();
        let mut last = p.xp_to_next;
        for _ in 0..30 {
            p.gain_xp(last, &GameConfig::default());
            assert!(p.xp_to_next >= last);
            assert!(p.xp_to_next > 0);
            last = p.xp_to_next;
        }
    }

    #[test]
    fn test_gain_xp_level_up_revives_dead_player() {
        let mut p = fresh();
        p.take_damage(200);
        assert!(!p.alive);

        p.gain_xp(45, &GameConfig::default());

        assert!(p.alive);
        assert_eq!(p.hp, p.max_hp);
    }

    #[test]
    fn test_level_up_leaves_input_untouched() {
        let before = fresh();
        let (after, ups) = level_up(&before, 45, &GameConfig::default());
        assert_eq!(before.level, 1);
        assert_eq!(before.xp, 0);
        assert_eq!(after.level, 2);
        assert_eq!(ups.len(), 1);
    }

    #[test]
    fn test_view_exposes_public_fields() {
        let view = fresh().view();
        assert_eq!(view.id, PlayerId::from("p1"));
        assert_eq!(view.name, "Ayla");
        assert_eq!(view.xp_to_next, 45);
        assert!(view.alive);
    }
}
