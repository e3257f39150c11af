//! Game session: phase routing, fixed-step driving and deferred tasks
//!
//! A [`Session`] owns the one mutable [`GameState`] plus its collaborators
//! (storage, settings). Frontends feed it [`Command`]s between frames and
//! call [`Session::update`] once per frame.
//!
//! Waiting (the pause before the next wave, voice listening restarts) is
//! modeled as [`ScheduledTask`]s stamped with the session ID they belong to.
//! A task whose session or phase is no longer current is dropped when due.

use serde::Serialize;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::cues::{self, CueSink};
use crate::persistence::Storage;
use crate::platform::voice;
use crate::settings::Settings;
use crate::sim::{Difficulty, GameEvent, GamePhase, GameState, InputToken, TickInput, apply_token, tick};
use crate::statistics::GameStatistics;
use crate::tuning::Tuning;

/// Something the player or the frontend asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start from the menu or game over; `None` uses the preferred difficulty
    StartGame(Option<Difficulty>),
    TogglePause,
    ShowStatistics,
    ShowSettings,
    BackToMenu,
    ResetStatistics,
    /// Keyboard or numeric pad
    Input(InputToken),
    /// Final recognizer result
    Transcript { text: String, confidence: f32 },
    /// Player x on the pickup line
    MovePlayer(f32),
    /// New viewport width (applies from the next wave)
    Resize(f32),
    UpdateSettings(Settings),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    StartNextWave,
    RestartListening,
}

impl TaskKind {
    /// Phase the session must still be in for the task to run
    fn expected_phase(self) -> GamePhase {
        match self {
            TaskKind::StartNextWave => GamePhase::WaveComplete,
            TaskKind::RestartListening => GamePhase::Playing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduledTask {
    /// Session clock time (s)
    pub fire_at: f64,
    pub session_id: u64,
    pub kind: TaskKind,
}

/// Pending deferred tasks
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn schedule(&mut self, task: ScheduledTask) {
        self.tasks.push(task);
    }

    /// Drop every pending task of a kind
    pub fn cancel(&mut self, kind: TaskKind) {
        self.tasks.retain(|t| t.kind != kind);
    }

    /// Remove and return every task due at `now`, earliest first
    pub fn take_due(&mut self, now: f64) -> Vec<ScheduledTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.tasks.drain(..).partition(|t| t.fire_at <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));
        due
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// One player's session
pub struct Session<S: Storage> {
    pub state: GameState,
    settings: Settings,
    storage: S,
    scheduler: Scheduler,
    /// Seconds since the session was created, advancing in every phase
    clock: f64,
    accumulator: f32,
    input: TickInput,
    listen_requests: u32,
}

impl<S: Storage> Session<S> {
    /// Load persisted statistics and settings, then sit in the menu
    pub fn new(storage: S, seed: u64, tuning: Tuning) -> Self {
        let statistics = GameStatistics::load(&storage);
        let settings = Settings::load(&storage);
        log::info!("Session created with seed {seed}");
        Self {
            state: GameState::new(seed, tuning, statistics),
            settings,
            storage,
            scheduler: Scheduler::default(),
            clock: 0.0,
            accumulator: 0.0,
            input: TickInput::default(),
            listen_requests: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Number of voice restarts requested since the last call
    pub fn take_listen_requests(&mut self) -> u32 {
        std::mem::take(&mut self.listen_requests)
    }

    /// Apply a command immediately
    pub fn handle(&mut self, command: Command) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match command {
            Command::StartGame(difficulty) => {
                let difficulty = difficulty.unwrap_or(self.settings.difficulty);
                events = self.state.start_game(difficulty);
                if !events.is_empty() {
                    self.accumulator = 0.0;
                    self.schedule_listening();
                }
            }
            Command::TogglePause => {
                events.extend(self.state.toggle_pause());
                if self.state.phase == GamePhase::Playing {
                    self.schedule_listening();
                }
            }
            Command::ShowStatistics => events.extend(self.state.set_phase(GamePhase::Statistics)),
            Command::ShowSettings => events.extend(self.state.set_phase(GamePhase::Settings)),
            Command::BackToMenu => {
                if let Some(event) = self.state.set_phase(GamePhase::Menu) {
                    // Anything still scheduled belongs to the abandoned run
                    self.state.session_id += 1;
                    self.state.clear_board();
                    self.state.effects.clear();
                    events.push(event);
                }
            }
            Command::ResetStatistics => {
                if !matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused | GamePhase::WaveComplete) {
                    self.state.statistics = GameStatistics::default();
                    self.state.statistics.save(&mut self.storage);
                    log::info!("Statistics reset");
                    events.push(GameEvent::StatisticsReset);
                }
            }
            Command::Input(token) => events = apply_token(&mut self.state, token),
            Command::Transcript { text, confidence } => {
                for token in voice::transcript_tokens(&text, confidence, &self.settings) {
                    events.extend(apply_token(&mut self.state, token));
                }
            }
            Command::MovePlayer(x) => self.input.player_x = Some(x),
            Command::Resize(width) => self.state.viewport_width = width.max(1.0),
            Command::UpdateSettings(settings) => {
                self.settings = settings.sanitized();
                self.settings.save(&mut self.storage);
            }
        }
        self.after_events(&events);
        events
    }

    /// Advance by one frame of `dt` seconds: fixed-step ticks, then due tasks
    pub fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.clock += dt as f64;
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let step = tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.after_events(&step);
            events.extend(step);
        }

        for task in self.scheduler.take_due(self.clock) {
            events.extend(self.run_task(task));
        }
        events
    }

    /// Route events to a cue sink using the current settings
    pub fn dispatch_cues(&self, events: &[GameEvent], sink: &mut dyn CueSink) {
        cues::dispatch(events, &self.settings, self.state.tuning.streak_step, sink);
    }

    /// JSON snapshot of the game state for the renderer
    pub fn snapshot_json(&self) -> Option<String> {
        match serde_json::to_string(&self.state) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Failed to serialize snapshot: {e}");
                None
            }
        }
    }

    fn after_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::WaveCleared { .. } => self.scheduler.schedule(ScheduledTask {
                    fire_at: self.clock + self.state.tuning.wave_advance_delay,
                    session_id: self.state.session_id,
                    kind: TaskKind::StartNextWave,
                }),
                GameEvent::GameOver { .. } => self.state.statistics.save(&mut self.storage),
                _ => {}
            }
        }
    }

    fn schedule_listening(&mut self) {
        self.scheduler.cancel(TaskKind::RestartListening);
        if !self.settings.voice_input {
            return;
        }
        self.scheduler.schedule(ScheduledTask {
            fire_at: self.clock + self.state.tuning.listen_restart_interval,
            session_id: self.state.session_id,
            kind: TaskKind::RestartListening,
        });
    }

    fn run_task(&mut self, task: ScheduledTask) -> Vec<GameEvent> {
        if task.session_id != self.state.session_id || self.state.phase != task.kind.expected_phase() {
            log::debug!("Dropping stale {:?} for session {}", task.kind, task.session_id);
            return Vec::new();
        }
        match task.kind {
            TaskKind::StartNextWave => {
                let events = self.state.start_next_wave();
                self.accumulator = 0.0;
                if !events.is_empty() {
                    self.schedule_listening();
                }
                events
            }
            TaskKind::RestartListening => {
                self.listen_requests += 1;
                self.schedule_listening();
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BOUNDARY_Y;
    use crate::persistence::MemoryStorage;
    use crate::platform::input::tokens_for;
    use crate::sim::canonical_answer;

    fn session(seed: u64) -> Session<MemoryStorage> {
        Session::new(MemoryStorage::new(), seed, Tuning::default())
    }

    fn run(session: &mut Session<MemoryStorage>, seconds: f32) -> Vec<GameEvent> {
        let frames = (seconds / SIM_DT).round() as usize;
        (0..frames).flat_map(|_| session.update(SIM_DT)).collect()
    }

    fn clear_wave(session: &mut Session<MemoryStorage>) {
        session.state.problems.clear();
        session.state.handled = session.state.total_in_wave;
        let events = run(session, SIM_DT);
        assert!(events.contains(&GameEvent::WaveCleared { wave: session.state.wave }));
    }

    #[test]
    fn test_starts_in_menu() {
        let s = session(1);
        assert_eq!(s.state.phase, GamePhase::Menu);
        assert!(s.scheduler().is_empty());
    }

    #[test]
    fn test_next_wave_starts_after_delay() {
        let mut s = session(1);
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        clear_wave(&mut s);
        assert_eq!(s.state.phase, GamePhase::WaveComplete);

        run(&mut s, 1.0);
        assert_eq!(s.state.phase, GamePhase::WaveComplete);
        let events = run(&mut s, 1.5);
        assert!(events.iter().any(|e| matches!(e, GameEvent::WaveStarted { wave: 2, .. })));
        assert_eq!(s.state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_wave_advance_after_menu_exit_is_noop() {
        let mut s = session(2);
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        clear_wave(&mut s);
        s.handle(Command::BackToMenu);
        assert_eq!(s.state.phase, GamePhase::Menu);

        let events = run(&mut s, 3.0);
        assert!(events.is_empty());
        assert_eq!(s.state.phase, GamePhase::Menu);
        assert!(s.scheduler().is_empty());
    }

    #[test]
    fn test_wave_advance_from_previous_run_is_noop() {
        let mut s = session(3);
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        clear_wave(&mut s);
        s.handle(Command::BackToMenu);
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        s.state.problems.iter_mut().for_each(|p| p.pos.y = -1000.0);

        run(&mut s, 3.0);
        assert_eq!(s.state.wave, 1);
        assert_eq!(s.state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_typed_answer_scores() {
        let mut s = session(4);
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        s.state.tuning.spawn_base_chance = 0.0;
        s.state.tuning.spawn_chance_per_wave = 0.0;
        s.state.tuning.spawn_chance_per_correct = 0.0;
        let lowest = s.state.problems[0].clone();
        let mut events = Vec::new();
        for token in tokens_for(&canonical_answer(lowest.answer)) {
            events.extend(s.handle(Command::Input(token)));
        }
        assert!(events.iter().any(|e| matches!(e, GameEvent::ProblemSolved { id, .. } if *id == lowest.id)));
        assert_eq!(s.state.score, 10);
    }

    #[test]
    fn test_game_over_persists_statistics() {
        let mut s = session(5);
        s.handle(Command::StartGame(None));
        assert_eq!(s.state.difficulty, Difficulty::Medium);
        s.state.score = 50;
        s.state.lives = 1;
        s.state.problems[0].pos.y = BOUNDARY_Y + 1.0;
        let events = run(&mut s, SIM_DT);
        assert!(events.contains(&GameEvent::GameOver { score: 50, new_high_score: true }));
        assert_eq!(GameStatistics::load(s.storage()).high_score(), 50);

        s.handle(Command::BackToMenu);
        s.handle(Command::ShowStatistics);
        assert_eq!(s.handle(Command::ResetStatistics), vec![GameEvent::StatisticsReset]);
        assert_eq!(GameStatistics::load(s.storage()), GameStatistics::default());
    }

    #[test]
    fn test_reset_refused_mid_game() {
        let mut s = session(6);
        s.handle(Command::StartGame(None));
        assert!(s.handle(Command::ResetStatistics).is_empty());
    }

    #[test]
    fn test_pause_freezes_board() {
        let mut s = session(7);
        s.handle(Command::StartGame(None));
        s.handle(Command::TogglePause);
        let y = s.state.problems[0].pos.y;
        run(&mut s, 1.0);
        assert_eq!(s.state.problems[0].pos.y, y);
        s.handle(Command::TogglePause);
        run(&mut s, 0.5);
        assert!(s.state.problems[0].pos.y > y);
    }

    #[test]
    fn test_listening_restarts_only_while_playing() {
        let mut storage = MemoryStorage::new();
        Settings {
            voice_input: true,
            ..Default::default()
        }
        .save(&mut storage);
        let mut s = Session::new(storage, 8, Tuning::default());
        s.handle(Command::StartGame(None));
        s.state.problems.iter_mut().for_each(|p| p.pos.y = -10_000.0);

        run(&mut s, 5.5);
        assert_eq!(s.take_listen_requests(), 1);
        s.handle(Command::TogglePause);
        run(&mut s, 10.0);
        assert_eq!(s.take_listen_requests(), 0);
        s.handle(Command::TogglePause);
        run(&mut s, 5.5);
        assert_eq!(s.take_listen_requests(), 1);
    }

    #[test]
    fn test_listening_resumes_after_wave_gap() {
        let mut s = session(10);
        s.handle(Command::UpdateSettings(Settings {
            voice_input: true,
            ..Default::default()
        }));
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        s.state.problems.iter_mut().for_each(|p| p.pos.y = -10_000.0);

        // The pending restart comes due while the next wave is still waiting
        run(&mut s, 4.5);
        clear_wave(&mut s);
        run(&mut s, 3.0);
        assert_eq!(s.state.wave, 2);
        assert_eq!(s.state.phase, GamePhase::Playing);
        assert_eq!(s.take_listen_requests(), 0);

        s.state.problems.iter_mut().for_each(|p| p.pos.y = -10_000.0);
        run(&mut s, 10.0);
        assert_eq!(s.take_listen_requests(), 2);
    }

    #[test]
    fn test_voice_transcript_types_answer() {
        let mut s = session(9);
        s.handle(Command::UpdateSettings(Settings {
            voice_input: true,
            ..Default::default()
        }));
        s.handle(Command::StartGame(Some(Difficulty::Easy)));
        let target = s.state.problems[0].clone();
        let text = format!("I think it is {}", canonical_answer(target.answer));
        s.handle(Command::Transcript { text, confidence: 0.95 });
        assert!(s.state.problem(target.id).is_none());
        assert!(Settings::load(s.storage()).voice_input);
    }

    #[test]
    fn test_same_seed_same_session() {
        let mut a = session(42);
        let mut b = session(42);
        for s in [&mut a, &mut b] {
            s.handle(Command::StartGame(Some(Difficulty::Hard)));
            s.handle(Command::MovePlayer(120.0));
            run(s, 4.0);
        }
        assert_eq!(a.snapshot_json(), b.snapshot_json());
    }
}
