//! Scoring engine
//!
//! Points for a resolution, streak bookkeeping, and the penalty paths for
//! rejected input and missed problems.

use serde::Serialize;

use super::powerup::{self, PowerUpKind};
use super::state::{GameEvent, GameState};
use crate::tuning::Tuning;

/// How a single resolution's points were put together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: u64,
    /// `floor(wave / 2) + 1`
    pub wave_multiplier: u64,
    /// `floor(streak / step) + 1`, using the streak before this answer
    pub streak_multiplier: u64,
    /// Score-multiplier effect factor (1 when inactive)
    pub bonus_multiplier: u64,
}

impl ScoreBreakdown {
    pub fn compute(tuning: &Tuning, wave: u32, streak: u32, bonus_active: bool) -> Self {
        Self {
            base: tuning.base_score,
            wave_multiplier: (wave / 2) as u64 + 1,
            streak_multiplier: (streak / tuning.streak_step.max(1)) as u64 + 1,
            bonus_multiplier: if bonus_active { tuning.score_multiplier_bonus } else { 1 },
        }
    }

    pub fn total(&self) -> u64 {
        self.base * self.wave_multiplier * self.streak_multiplier * self.bonus_multiplier
    }
}

/// Register a correct answer on problem `id`.
///
/// Problems with hit-points left take a hit and stay; otherwise the problem
/// is destroyed, scored, counted as handled and may drop a power-up.
pub fn resolve_correct(state: &mut GameState, id: u32) -> Vec<GameEvent> {
    let Some(index) = state.problems.iter().position(|p| p.id == id) else {
        return Vec::new();
    };
    let breakdown = ScoreBreakdown::compute(
        &state.tuning,
        state.wave,
        state.statistics.current_streak(),
        state.effects.is_active(PowerUpKind::ScoreMultiplier),
    );
    state.statistics.record_correct();
    state.input.clear();
    state.target = None;

    let problem = &mut state.problems[index];
    problem.hp = problem.hp.saturating_sub(1);
    if problem.hp > 0 {
        return vec![GameEvent::ProblemHit { id, hp_left: problem.hp }];
    }

    let problem = state.problems.remove(index);
    let points = breakdown.total();
    state.score += points;
    state.handled += 1;
    log::debug!("Solved {} = {} for {points} points", problem.text, problem.answer);

    let mut events = vec![GameEvent::ProblemSolved {
        id,
        personality: problem.personality,
        points,
        streak: state.statistics.current_streak(),
    }];
    events.extend(powerup::try_spawn(state, problem.pos));
    events
}

/// Input that matches no problem: streak broken, buffer cleared
pub fn reject_input(state: &mut GameState) -> GameEvent {
    state.statistics.record_miss();
    state.input.clear();
    state.target = None;
    GameEvent::InputRejected
}

/// A problem crossed the boundary. Returns whether a life was lost.
pub fn register_boundary_miss(state: &mut GameState) -> bool {
    state.handled += 1;
    state.statistics.record_miss();
    if state.effects.is_active(PowerUpKind::Shield) {
        return false;
    }
    state.lives -= 1;
    true
}
