//! Data-driven game balance
//!
//! Every number that shapes difficulty lives here so it can be overridden
//! from JSON without touching simulation code. `Tuning::default()` is the
//! shipped balance.

use serde::{Deserialize, Serialize};

use crate::sim::powerup::PowerUpKind;
use crate::sim::state::Difficulty;

/// Per-difficulty balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyTuning {
    /// Problems in wave 1 before the count multiplier
    pub base_count: f32,
    /// Extra problems per wave after the first
    pub count_increment: f32,
    /// Final multiplier on the wave size (result is floored)
    pub count_multiplier: f32,
    /// Scales operand upper bounds in the problem factory
    pub magnitude_multiplier: f32,
    /// Scales each problem's own descent speed
    pub speed_multiplier: f32,
    /// Scales the whole board's movement each tick
    pub tick_multiplier: f32,
    /// Scales vertical spacing between staggered problems
    pub spacing_multiplier: f32,
    /// Complexity score at which problems become neutral
    pub neutral_threshold: f32,
    /// Complexity score at which problems become aggressive (None = unreachable)
    pub aggressive_threshold: Option<f32>,
    /// Complexity score at which problems become bosses (None = unreachable)
    pub boss_threshold: Option<f32>,
    /// Chance that the classification is replaced by a random pick
    pub override_chance: f64,
}

/// Per-kind power-up configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpTuning {
    /// Effect duration in seconds (0 = instantaneous)
    pub duration: f32,
    /// Base acceptance probability in the rarity roll (lower = rarer)
    pub rarity: f64,
}

/// Complete balance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Indexed by `Difficulty::index()`
    pub difficulties: [DifficultyTuning; 3],
    /// Indexed by `PowerUpKind::index()`
    pub power_ups: [PowerUpTuning; PowerUpKind::COUNT],

    // === Problem descent ===
    /// Base descent speed (px/s) before the difficulty multiplier
    pub base_speed: f32,
    /// Descent speed gained per wave (px/s)
    pub speed_per_wave: f32,
    /// Upper bound of the random speed jitter (px/s)
    pub speed_jitter: f32,
    /// Extra board speed at 100% wave progress (fraction)
    pub progress_speed_boost: f32,
    /// Extra board speed per wave after the first (fraction)
    pub wave_speed_growth: f32,

    // === Wave layout ===
    /// Y of the first problem in a wave (above the viewport)
    pub spawn_y: f32,
    /// Vertical stagger for wave 1 before decay
    pub base_spacing: f32,
    /// Stagger lost per wave
    pub spacing_decay: f32,
    /// Stagger floor before the difficulty multiplier
    pub min_spacing: f32,
    /// Horizontal distance under which two problems overlap
    pub overlap_x: f32,
    /// Vertical distance under which two problems share a band
    pub overlap_y: f32,
    /// Placement retries before accepting an overlapping spot
    pub placement_attempts: u32,
    /// Viewports narrower than this use the wide margin
    pub narrow_viewport: f32,
    /// Side margin on normal viewports
    pub margin: f32,
    /// Side margin on narrow viewports
    pub narrow_margin: f32,

    // === Classification ===
    /// Complexity gained per wave
    pub complexity_per_wave: f32,

    // === Scoring ===
    pub base_score: u64,
    /// Streak length per streak multiplier step
    pub streak_step: u32,
    /// Bonus factor while the score multiplier is active
    pub score_multiplier_bonus: u64,

    // === Power-ups ===
    pub spawn_base_chance: f64,
    pub spawn_chance_per_wave: f64,
    pub spawn_chance_per_correct: f64,
    pub spawn_chance_cap: f64,
    /// Added to every rarity per wave in the kind roll
    pub rarity_per_wave: f64,
    pub rarity_wave_cap: f64,
    /// Kind used when the rarity roll rejects every kind
    pub fallback_kind: PowerUpKind,
    /// Board speed factor while time-slowdown is active
    pub slowdown_factor: f32,
    /// Power-up descent speed range (px/s)
    pub power_up_min_speed: f32,
    pub power_up_max_speed: f32,
    /// Pickup radius around the player
    pub collect_radius: f32,

    // === Flow ===
    /// Delay between wave cleared and the next wave (s)
    pub wave_advance_delay: f64,
    /// Interval between voice listening restarts (s)
    pub listen_restart_interval: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            difficulties: [
                // Easy
                DifficultyTuning {
                    base_count: 8.0,
                    count_increment: 1.0,
                    count_multiplier: 1.0,
                    magnitude_multiplier: 1.0,
                    speed_multiplier: 0.8,
                    tick_multiplier: 0.9,
                    spacing_multiplier: 1.0,
                    neutral_threshold: 2.5,
                    aggressive_threshold: None,
                    boss_threshold: None,
                    override_chance: 0.20,
                },
                // Medium
                DifficultyTuning {
                    base_count: 10.0,
                    count_increment: 1.5,
                    count_multiplier: 1.0,
                    magnitude_multiplier: 1.5,
                    speed_multiplier: 1.0,
                    tick_multiplier: 1.0,
                    spacing_multiplier: 1.6,
                    neutral_threshold: 2.0,
                    aggressive_threshold: None,
                    boss_threshold: None,
                    override_chance: 0.25,
                },
                // Hard
                DifficultyTuning {
                    base_count: 12.0,
                    count_increment: 2.0,
                    count_multiplier: 1.2,
                    magnitude_multiplier: 2.0,
                    speed_multiplier: 1.3,
                    tick_multiplier: 1.1,
                    spacing_multiplier: 2.2,
                    neutral_threshold: 2.0,
                    aggressive_threshold: Some(3.5),
                    boss_threshold: Some(4.6),
                    override_chance: 0.35,
                },
            ],
            power_ups: [
                // TimeSlowdown
                PowerUpTuning { duration: 30.0, rarity: 0.3 },
                // DestroyAll
                PowerUpTuning { duration: 0.0, rarity: 0.1 },
                // Shield
                PowerUpTuning { duration: 45.0, rarity: 0.25 },
                // RapidFire
                PowerUpTuning { duration: 20.0, rarity: 0.2 },
                // ScoreMultiplier
                PowerUpTuning { duration: 60.0, rarity: 0.4 },
                // Freeze
                PowerUpTuning { duration: 15.0, rarity: 0.15 },
            ],

            base_speed: 20.0,
            speed_per_wave: 2.0,
            speed_jitter: 12.0,
            progress_speed_boost: 0.03,
            wave_speed_growth: 0.02,

            spawn_y: -50.0,
            base_spacing: 100.0,
            spacing_decay: 3.0,
            min_spacing: 50.0,
            overlap_x: 80.0,
            overlap_y: 120.0,
            placement_attempts: 10,
            narrow_viewport: 600.0,
            margin: 10.0,
            narrow_margin: 20.0,

            complexity_per_wave: 0.1,

            base_score: 10,
            streak_step: 5,
            score_multiplier_bonus: 2,

            spawn_base_chance: 0.0026,
            spawn_chance_per_wave: 0.00065,
            spawn_chance_per_correct: 0.00013,
            spawn_chance_cap: 0.0195,
            rarity_per_wave: 0.1,
            rarity_wave_cap: 0.5,
            fallback_kind: PowerUpKind::ScoreMultiplier,
            slowdown_factor: 0.5,
            power_up_min_speed: 30.0,
            power_up_max_speed: 48.0,
            collect_radius: 40.0,

            wave_advance_delay: 2.0,
            listen_restart_interval: 5.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Balance table for a difficulty tier
    #[inline]
    pub fn difficulty(&self, difficulty: Difficulty) -> &DifficultyTuning {
        &self.difficulties[difficulty.index()]
    }

    /// Configuration for a power-up kind
    #[inline]
    pub fn power_up(&self, kind: PowerUpKind) -> &PowerUpTuning {
        &self.power_ups[kind.index()]
    }

    /// Problems in a wave: `floor((base + (wave-1) × increment) × multiplier)`
    pub fn wave_size(&self, wave: u32, difficulty: Difficulty) -> u32 {
        let t = self.difficulty(difficulty);
        let raw = (t.base_count + wave.saturating_sub(1) as f32 * t.count_increment)
            * t.count_multiplier;
        raw.floor().max(1.0) as u32
    }

    /// Vertical stagger between consecutive problems of a wave
    pub fn wave_spacing(&self, wave: u32, difficulty: Difficulty) -> f32 {
        let decayed = (self.base_spacing - wave as f32 * self.spacing_decay).max(self.min_spacing);
        decayed * self.difficulty(difficulty).spacing_multiplier
    }

    /// Side margin for a viewport width
    pub fn margin_for(&self, viewport_width: f32) -> f32 {
        if viewport_width < self.narrow_viewport {
            self.narrow_margin
        } else {
            self.margin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_size_formula() {
        let t = Tuning::default();
        assert_eq!(t.wave_size(1, Difficulty::Easy), 8);
        assert_eq!(t.wave_size(3, Difficulty::Easy), 10);
        // (10 + 2 × 1.5) × 1.0 = 13
        assert_eq!(t.wave_size(3, Difficulty::Medium), 13);
        // (12 + 1 × 2) × 1.2 = 16.8 → 16
        assert_eq!(t.wave_size(2, Difficulty::Hard), 16);
    }

    #[test]
    fn test_spacing_decays_to_floor() {
        let t = Tuning::default();
        let early = t.wave_spacing(1, Difficulty::Easy);
        let late = t.wave_spacing(40, Difficulty::Easy);
        assert!(early > late);
        assert_eq!(late, t.min_spacing);
        assert!(t.wave_spacing(1, Difficulty::Hard) > t.wave_spacing(1, Difficulty::Easy));
    }

    #[test]
    fn test_partial_json_override() {
        let t = Tuning::from_json(r#"{ "base_score": 25, "collect_radius": 60.0 }"#).unwrap();
        assert_eq!(t.base_score, 25);
        assert_eq!(t.collect_radius, 60.0);
        assert_eq!(t.wave_size(1, Difficulty::Easy), 8);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Tuning::from_json("{ not json").is_err());
    }

    #[test]
    fn test_narrow_viewport_margin() {
        let t = Tuning::default();
        assert_eq!(t.margin_for(400.0), t.narrow_margin);
        assert_eq!(t.margin_for(800.0), t.margin);
        assert!(t.narrow_margin > t.margin);
    }
}
