//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Simulated time only (no wall clock)
//! - No rendering, audio or platform dependencies

pub mod expr;
pub mod matcher;
pub mod powerup;
pub mod problem;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod wave;

pub use matcher::{InputToken, apply_token, canonical_answer, find_target};
pub use powerup::{ActiveEffects, PowerUp, PowerUpKind};
pub use problem::{OperatorFamily, Personality, Problem, ProblemFactory, SizeClass};
pub use scoring::ScoreBreakdown;
pub use state::{Difficulty, GameEvent, GamePhase, GameState};
pub use tick::{TickInput, global_speed_multiplier, tick};
pub use wave::{Wave, generate_wave};
