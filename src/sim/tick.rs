//! Fixed timestep simulation tick
//!
//! Advances the board deterministically. Per tick: pickups and instant
//! effects first, then movement and the boundary check, then effect timers,
//! then the game-over / wave-complete decision.

use super::matcher;
use super::powerup;
use super::scoring;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Input sampled once per tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player x on the pickup line (pointer/touch)
    pub player_x: Option<f32>,
    /// Pause toggle
    pub pause: bool,
}

/// Board speed factor for this tick
pub fn global_speed_multiplier(state: &GameState) -> f32 {
    let t = &state.tuning;
    let growth = 1.0
        + state.wave_progress() * t.progress_speed_boost
        + state.wave.saturating_sub(1) as f32 * t.wave_speed_growth;
    growth * t.difficulty(state.difficulty).tick_multiplier * state.effects.speed_factor(t.slowdown_factor)
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.pause {
        events.extend(state.toggle_pause());
    }
    if state.phase != GamePhase::Playing {
        return events;
    }

    state.time_secs += dt as f64;
    if let Some(x) = input.player_x {
        state.player_x = x.clamp(0.0, state.viewport_width);
    }

    // Pickups before the boundary check so destroy-all counts this tick
    powerup::advance_falling(state, dt);
    events.extend(powerup::collect(state));

    let multiplier = global_speed_multiplier(state);
    for problem in &mut state.problems {
        problem.pos.y += problem.speed * multiplier * dt;
    }

    let (missed, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut state.problems)
        .into_iter()
        .partition(|p| p.pos.y > BOUNDARY_Y);
    state.problems = remaining;
    for problem in missed {
        let life_lost = scoring::register_boundary_miss(state);
        log::debug!("Missed {} (life lost: {life_lost})", problem.text);
        if state.target == Some(problem.id) {
            state.input.clear();
            state.target = None;
        }
        events.push(GameEvent::ProblemMissed { id: problem.id, life_lost });
    }
    // The buffer may now point somewhere else
    if state.target.is_none() && !state.input.is_empty() {
        state.target = matcher::find_target(&state.problems, &state.input).map(|p| p.id);
    }

    for kind in state.effects.advance(dt) {
        log::debug!("{} expired", kind.name());
        events.push(GameEvent::PowerUpExpired { kind });
    }

    if state.lives <= 0 {
        events.extend(end_game(state));
    } else if state.is_wave_complete() {
        events.extend(state.set_phase(GamePhase::WaveComplete));
        state.clear_board();
        log::info!("Wave {} cleared, score {}", state.wave, state.score);
        events.push(GameEvent::WaveCleared { wave: state.wave });
    }

    events
}

fn end_game(state: &mut GameState) -> Vec<GameEvent> {
    state.lives = 0;
    let mut events: Vec<GameEvent> = state.set_phase(GamePhase::GameOver).into_iter().collect();
    let played = (state.time_secs - state.game_start_time).max(0.0) as u64;
    let new_high_score = state.statistics.finalize(state.score, played);
    state.clear_board();
    state.effects.clear();
    log::info!(
        "Game over at wave {} with {} points (new high score: {new_high_score})",
        state.wave,
        state.score
    );
    events.push(GameEvent::GameOver { score: state.score, new_high_score });
    events
}
