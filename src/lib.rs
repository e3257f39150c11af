//! Math Fall - a type-the-answer falling arithmetic arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (problems, waves, matching, scoring, power-ups)
//! - `session`: Phase routing, fixed-step driving and deferred tasks
//! - `platform`: Browser/native platform abstraction and input adapters
//! - `persistence`: Statistics and settings storage
//! - `tuning`: Data-driven game balance

pub mod cues;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod statistics;
pub mod tuning;

pub use session::{Command, Session};
pub use settings::Settings;
pub use statistics::GameStatistics;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame accepted (tab switches, debugger stops)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Board layout (pixels, y grows downward)
    pub const VIEWPORT_HEIGHT: f32 = 600.0;
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;
    /// Problems below this line are missed
    pub const BOUNDARY_Y: f32 = 550.0;
    /// Pickup line the player moves along
    pub const PLAYER_Y: f32 = 570.0;

    pub const STARTING_LIVES: i32 = 3;

    /// Estimated glyph width for placement
    pub const CHAR_WIDTH: f32 = 12.0;
    /// Non-integer answers are rounded to this many decimals
    pub const ANSWER_DECIMALS: u32 = 2;
    /// Tolerance for numeric answer comparison
    pub const ANSWER_EPSILON: f64 = 1e-6;
}
