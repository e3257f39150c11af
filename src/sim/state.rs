//! Game state and core simulation types
//!
//! `GameState` is the single aggregate root of a session. Everything the
//! renderer needs is in the serialized snapshot; the RNG and tuning ride
//! along but are skipped.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::powerup::{ActiveEffects, PowerUp, PowerUpKind};
use super::problem::{Personality, Problem};
use super::wave::{Wave, generate_wave};
use crate::consts::*;
use crate::statistics::GameStatistics;
use crate::tuning::Tuning;

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Slot in per-difficulty tables
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title menu (initial phase)
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Gameplay suspended
    Paused,
    /// Board cleared, next wave pending
    WaveComplete,
    /// Lives exhausted
    GameOver,
    /// Statistics screen
    Statistics,
    /// Settings screen
    Settings,
}

impl GamePhase {
    /// Allowed phase transitions
    pub fn can_transition_to(self, to: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (self, to),
            (Menu | GameOver, Playing)
                | (Playing, Paused | WaveComplete | GameOver)
                | (Paused, Playing)
                | (WaveComplete, Playing)
                | (GameOver, Menu)
                | (Menu | Paused, Statistics | Settings)
                | (Statistics | Settings | Paused | WaveComplete, Menu)
        )
    }
}

/// Something the core did that collaborators (audio, haptics, UI) react to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    WaveStarted { wave: u32, total: u32 },
    /// Input now points at this problem
    TargetAcquired { id: u32 },
    /// Correct answer on a problem that still has hit-points
    ProblemHit { id: u32, hp_left: u8 },
    /// Problem destroyed by a correct answer
    ProblemSolved { id: u32, personality: Personality, points: u64, streak: u32 },
    /// Input matched nothing and was cleared
    InputRejected,
    /// Problem crossed the boundary
    ProblemMissed { id: u32, life_lost: bool },
    PowerUpSpawned { id: u32, kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    /// Problems cleared by an instantaneous effect
    ProblemsCleared { count: u32 },
    WaveCleared { wave: u32 },
    GameOver { score: u64, new_high_score: bool },
    StatisticsReset,
}

/// Complete game state
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Bumped whenever play is (re)started or abandoned
    pub session_id: u64,
    pub phase: GamePhase,
    pub difficulty: Difficulty,
    pub score: u64,
    pub lives: i32,
    /// Current wave (1-based, 0 before the first game)
    pub wave: u32,
    pub viewport_width: f32,
    /// Player's horizontal position on the pickup line
    pub player_x: f32,
    /// Problems on the board
    pub problems: Vec<Problem>,
    /// Falling power-ups
    pub power_ups: Vec<PowerUp>,
    /// Running timed effects
    pub effects: ActiveEffects,
    /// Pending digits/decimal point
    pub input: String,
    /// Problem the input currently points at
    pub target: Option<u32>,
    /// Problems generated for this wave
    pub total_in_wave: u32,
    /// Problems resolved, missed or cleared this wave
    pub handled: u32,
    pub statistics: GameStatistics,
    /// Simulated seconds spent playing
    pub time_secs: f64,
    pub game_start_time: f64,
    pub wave_start_time: f64,
    #[serde(skip)]
    pub tuning: Tuning,
    #[serde(skip)]
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create a session in the menu phase
    pub fn new(seed: u64, tuning: Tuning, statistics: GameStatistics) -> Self {
        Self {
            seed,
            session_id: 0,
            phase: GamePhase::Menu,
            difficulty: Difficulty::default(),
            score: 0,
            lives: STARTING_LIVES,
            wave: 0,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            player_x: DEFAULT_VIEWPORT_WIDTH / 2.0,
            problems: Vec::new(),
            power_ups: Vec::new(),
            effects: ActiveEffects::default(),
            input: String::new(),
            target: None,
            total_in_wave: 0,
            handled: 0,
            statistics,
            time_secs: 0.0,
            game_start_time: 0.0,
            wave_start_time: 0.0,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// RNG together with the balance table (disjoint borrows)
    pub fn rng_with_tuning(&mut self) -> (&mut Pcg32, &Tuning) {
        (&mut self.rng, &self.tuning)
    }

    /// Player position on the pickup line
    pub fn player_pos(&self) -> Vec2 {
        Vec2::new(self.player_x, PLAYER_Y)
    }

    pub fn problem(&self, id: u32) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Problem the input is aimed at, if it is still on the board
    pub fn target_problem(&self) -> Option<&Problem> {
        self.target.and_then(|id| self.problem(id))
    }

    /// Fraction of the wave already handled
    pub fn wave_progress(&self) -> f32 {
        if self.total_in_wave == 0 {
            return 0.0;
        }
        self.handled as f32 / self.total_in_wave as f32
    }

    /// Complete iff every problem was handled AND none remain on the board
    pub fn is_wave_complete(&self) -> bool {
        self.handled == self.total_in_wave && self.problems.is_empty()
    }

    /// Move to another phase if the transition is allowed
    pub fn set_phase(&mut self, to: GamePhase) -> Option<GameEvent> {
        let from = self.phase;
        if from == to || !from.can_transition_to(to) {
            log::debug!("Ignoring phase change {from:?} -> {to:?}");
            return None;
        }
        self.phase = to;
        Some(GameEvent::PhaseChanged { from, to })
    }

    /// Playing <-> Paused
    pub fn toggle_pause(&mut self) -> Option<GameEvent> {
        match self.phase {
            GamePhase::Playing => self.set_phase(GamePhase::Paused),
            GamePhase::Paused => self.set_phase(GamePhase::Playing),
            _ => None,
        }
    }

    /// Reset the run and start wave 1
    pub fn start_game(&mut self, difficulty: Difficulty) -> Vec<GameEvent> {
        if !matches!(self.phase, GamePhase::Menu | GamePhase::GameOver) {
            return Vec::new();
        }
        let mut events = Vec::new();
        events.extend(self.set_phase(GamePhase::Playing));
        self.session_id += 1;
        self.difficulty = difficulty;
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.effects.clear();
        self.power_ups.clear();
        self.statistics.reset_streak();
        self.game_start_time = self.time_secs;
        log::info!("Starting {} game (session {})", difficulty.as_str(), self.session_id);
        events.push(self.load_wave(1));
        events
    }

    /// Begin the wave after a completed one
    pub fn start_next_wave(&mut self) -> Vec<GameEvent> {
        if self.phase != GamePhase::WaveComplete {
            return Vec::new();
        }
        let mut events = Vec::new();
        events.extend(self.set_phase(GamePhase::Playing));
        events.push(self.load_wave(self.wave + 1));
        events
    }

    fn load_wave(&mut self, wave_number: u32) -> GameEvent {
        let first_id = self.next_id;
        let Wave { problems, total } = generate_wave(
            &mut self.rng,
            &self.tuning,
            first_id,
            wave_number,
            self.difficulty,
            self.viewport_width,
        );
        self.next_id += problems.len() as u32;
        self.wave = wave_number;
        self.problems = problems;
        self.total_in_wave = total;
        self.handled = 0;
        self.input.clear();
        self.target = None;
        self.wave_start_time = self.time_secs;
        log::info!("Wave {wave_number}: {total} problems");
        GameEvent::WaveStarted { wave: wave_number, total }
    }

    /// Abandon play and clear the board
    pub fn clear_board(&mut self) {
        self.problems.clear();
        self.power_ups.clear();
        self.input.clear();
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> GameState {
        GameState::new(7, Tuning::default(), GameStatistics::default())
    }

    #[test]
    fn test_initial_phase_is_menu() {
        let s = new_state();
        assert_eq!(s.phase, GamePhase::Menu);
        assert!(s.problems.is_empty());
    }

    #[test]
    fn test_phase_table() {
        use GamePhase::*;
        assert!(Menu.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Playing));
        assert!(Playing.can_transition_to(GameOver));
        assert!(GameOver.can_transition_to(Menu));
        assert!(Paused.can_transition_to(Settings));
        assert!(Settings.can_transition_to(Menu));
        assert!(!Menu.can_transition_to(GameOver));
        assert!(!Menu.can_transition_to(Paused));
        assert!(!WaveComplete.can_transition_to(GameOver));
        assert!(!Statistics.can_transition_to(Playing));
    }

    #[test]
    fn test_start_game_loads_wave_one() {
        let mut s = new_state();
        let events = s.start_game(Difficulty::Easy);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.wave, 1);
        assert_eq!(s.total_in_wave, s.problems.len() as u32);
        assert_eq!(s.session_id, 1);
        assert!(events.contains(&GameEvent::WaveStarted { wave: 1, total: s.total_in_wave }));
    }

    #[test]
    fn test_start_game_rejected_outside_menu() {
        let mut s = new_state();
        s.start_game(Difficulty::Easy);
        s.set_phase(GamePhase::Paused);
        assert!(s.start_game(Difficulty::Hard).is_empty());
        assert_eq!(s.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_wave_complete_needs_both_conditions() {
        let mut s = new_state();
        s.start_game(Difficulty::Easy);
        // Board still populated, counter short
        assert!(!s.is_wave_complete());
        // Counter satisfied, board not empty
        s.handled = s.total_in_wave;
        assert!(!s.is_wave_complete());
        // Board empty, counter short
        s.problems.clear();
        s.handled = s.total_in_wave - 1;
        assert!(!s.is_wave_complete());
        s.handled = s.total_in_wave;
        assert!(s.is_wave_complete());
    }

    #[test]
    fn test_ids_are_unique_across_waves() {
        let mut s = new_state();
        s.start_game(Difficulty::Medium);
        let first: Vec<u32> = s.problems.iter().map(|p| p.id).collect();
        s.problems.clear();
        s.handled = s.total_in_wave;
        s.set_phase(GamePhase::WaveComplete);
        s.start_next_wave();
        assert_eq!(s.wave, 2);
        assert!(s.problems.iter().all(|p| !first.contains(&p.id)));
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("EASY"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }
}
