//! Power-up controller
//!
//! Spawn rolls, rarity-weighted kind selection, pickup collection and the
//! timed-effect table.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GameState};
use crate::consts::VIEWPORT_HEIGHT;
use crate::tuning::Tuning;

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Scales board movement down
    TimeSlowdown,
    /// Instantly clears every problem on the board
    DestroyAll,
    /// Missed problems cost no life
    Shield,
    /// A prefix with a single candidate resolves immediately
    RapidFire,
    /// Doubles score gains
    ScoreMultiplier,
    /// Stops board movement entirely
    Freeze,
}

impl PowerUpKind {
    pub const COUNT: usize = 6;

    pub const ALL: [PowerUpKind; Self::COUNT] = [
        PowerUpKind::TimeSlowdown,
        PowerUpKind::DestroyAll,
        PowerUpKind::Shield,
        PowerUpKind::RapidFire,
        PowerUpKind::ScoreMultiplier,
        PowerUpKind::Freeze,
    ];

    /// Slot in per-kind tables
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PowerUpKind::TimeSlowdown => 0,
            PowerUpKind::DestroyAll => 1,
            PowerUpKind::Shield => 2,
            PowerUpKind::RapidFire => 3,
            PowerUpKind::ScoreMultiplier => 4,
            PowerUpKind::Freeze => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::TimeSlowdown => "Time Warp",
            PowerUpKind::DestroyAll => "Nuclear Strike",
            PowerUpKind::Shield => "Force Shield",
            PowerUpKind::RapidFire => "Rapid Fire",
            PowerUpKind::ScoreMultiplier => "Score Multiplier",
            PowerUpKind::Freeze => "Freeze Ray",
        }
    }
}

/// A falling collectible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Descent speed (px/s), independent of board modifiers
    pub speed: f32,
    pub collected: bool,
    /// Effect duration in seconds (0 for instantaneous kinds)
    pub duration: f32,
}

/// Timed effects, at most one per kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    /// Remaining seconds, indexed by `PowerUpKind::index()`
    remaining: [Option<f32>; PowerUpKind::COUNT],
}

impl ActiveEffects {
    #[inline]
    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.remaining[kind.index()].is_some()
    }

    #[inline]
    pub fn remaining(&self, kind: PowerUpKind) -> Option<f32> {
        self.remaining[kind.index()]
    }

    /// Register an effect, or reset its timer if already running
    pub fn activate(&mut self, kind: PowerUpKind, duration: f32) {
        if duration > 0.0 {
            self.remaining[kind.index()] = Some(duration);
        }
    }

    /// Count down every timer; returns the kinds that just expired
    pub fn advance(&mut self, dt: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        for kind in PowerUpKind::ALL {
            let i = kind.index();
            if let Some(left) = self.remaining[i] {
                let left = left - dt;
                if left <= 0.0 {
                    self.remaining[i] = None;
                    expired.push(kind);
                } else {
                    self.remaining[i] = Some(left);
                }
            }
        }
        expired
    }

    /// Iterate over running effects with their remaining time
    pub fn iter(&self) -> impl Iterator<Item = (PowerUpKind, f32)> + '_ {
        PowerUpKind::ALL
            .into_iter()
            .filter_map(|k| self.remaining(k).map(|t| (k, t)))
    }

    pub fn clear(&mut self) {
        self.remaining = Default::default();
    }

    /// Board movement factor: freeze dominates, then slowdown
    pub fn speed_factor(&self, slowdown_factor: f32) -> f32 {
        if self.is_active(PowerUpKind::Freeze) {
            0.0
        } else if self.is_active(PowerUpKind::TimeSlowdown) {
            slowdown_factor
        } else {
            1.0
        }
    }
}

/// Chance that a correct resolution drops a power-up
pub fn spawn_chance(tuning: &Tuning, wave: u32, correct_answers: u32) -> f64 {
    let chance = tuning.spawn_base_chance
        + wave as f64 * tuning.spawn_chance_per_wave
        + correct_answers as f64 * tuning.spawn_chance_per_correct;
    chance.min(tuning.spawn_chance_cap)
}

/// Roll whether a power-up drops
pub fn roll_spawn<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning, wave: u32, correct_answers: u32) -> bool {
    rng.random_bool(spawn_chance(tuning, wave, correct_answers).clamp(0.0, 1.0))
}

/// Rarity-weighted kind selection with fallback
pub fn choose_kind<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning, wave: u32) -> PowerUpKind {
    let wave_bonus = (wave as f64 * tuning.rarity_per_wave).min(tuning.rarity_wave_cap);
    let accepted: Vec<PowerUpKind> = PowerUpKind::ALL
        .into_iter()
        .filter(|&k| rng.random::<f64>() < tuning.power_up(k).rarity + wave_bonus)
        .collect();
    if accepted.is_empty() {
        tuning.fallback_kind
    } else {
        accepted[rng.random_range(0..accepted.len())]
    }
}

/// Create a power-up at a resolved problem's location
pub fn create<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning, id: u32, kind: PowerUpKind, pos: Vec2) -> PowerUp {
    let speed = if tuning.power_up_max_speed > tuning.power_up_min_speed {
        rng.random_range(tuning.power_up_min_speed..tuning.power_up_max_speed)
    } else {
        tuning.power_up_min_speed
    };
    PowerUp {
        id,
        kind,
        pos,
        speed,
        collected: false,
        duration: tuning.power_up(kind).duration,
    }
}

/// Whether an uncollected power-up is within pickup range of the player
pub fn in_pickup_range(power_up: &PowerUp, player: Vec2, radius: f32) -> bool {
    !power_up.collected
        && (power_up.pos.x - player.x).abs() <= radius
        && (power_up.pos.y - player.y).abs() <= radius
}

/// Roll for a drop at `pos` after a correct resolution
pub fn try_spawn(state: &mut GameState, pos: Vec2) -> Option<GameEvent> {
    let wave = state.wave;
    let correct = state.statistics.correct_answers();
    let kind = {
        let (rng, tuning) = state.rng_with_tuning();
        if !roll_spawn(rng, tuning, wave, correct) {
            return None;
        }
        choose_kind(rng, tuning, wave)
    };
    let id = state.next_entity_id();
    let (rng, tuning) = state.rng_with_tuning();
    let power_up = create(rng, tuning, id, kind, pos);
    log::debug!("Spawned {} at ({:.0}, {:.0})", kind.name(), pos.x, pos.y);
    state.power_ups.push(power_up);
    Some(GameEvent::PowerUpSpawned { id, kind })
}

/// Move falling power-ups; drop the ones that left the viewport
pub fn advance_falling(state: &mut GameState, dt: f32) {
    for power_up in &mut state.power_ups {
        power_up.pos.y += power_up.speed * dt;
    }
    state.power_ups.retain(|p| p.pos.y <= VIEWPORT_HEIGHT);
}

/// Collect everything within reach of the player and apply its effect
pub fn collect(state: &mut GameState) -> Vec<GameEvent> {
    let player = state.player_pos();
    let radius = state.tuning.collect_radius;
    let mut picked = Vec::new();
    for power_up in &mut state.power_ups {
        if in_pickup_range(power_up, player, radius) {
            power_up.collected = true;
            picked.push(power_up.kind);
        }
    }
    state.power_ups.retain(|p| !p.collected);

    let mut events = Vec::new();
    for kind in picked {
        log::info!("Collected {}", kind.name());
        events.push(GameEvent::PowerUpCollected { kind });
        events.extend(apply(state, kind));
    }
    events
}

/// Apply a collected power-up's effect
pub fn apply(state: &mut GameState, kind: PowerUpKind) -> Option<GameEvent> {
    match kind {
        PowerUpKind::DestroyAll => {
            let count = state.problems.len() as u32;
            state.problems.clear();
            state.handled += count;
            state.statistics.record_credited(count);
            state.input.clear();
            state.target = None;
            Some(GameEvent::ProblemsCleared { count })
        }
        _ => {
            let duration = state.tuning.power_up(kind).duration;
            state.effects.activate(kind, duration);
            None
        }
    }
}
