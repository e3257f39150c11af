//! Browser-facing session handle
//!
//! Thin wasm-bindgen wrapper over [`Session`]: the page forwards DOM input
//! and animation frames, and gets back JSON for events, cues and snapshots.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::input::parse_key;
use crate::cues::{CueSink, HapticHint, SoundCue};
use crate::persistence::LocalStorage;
use crate::session::{Command, Session};
use crate::sim::{Difficulty, GameEvent};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    super::init_logging();
    log::info!("Math Fall starting...");
}

/// Cues collected for one batch of events
#[derive(Default, Serialize)]
struct CueBuffer {
    sounds: Vec<(SoundCue, f32)>,
    haptics: Vec<HapticHint>,
}

impl CueSink for CueBuffer {
    fn sound(&mut self, cue: SoundCue, volume: f32) {
        self.sounds.push((cue, volume));
    }

    fn haptic(&mut self, hint: HapticHint) {
        self.haptics.push(hint);
    }
}

#[derive(Serialize)]
struct Outcome<'a> {
    events: &'a [GameEvent],
    cues: CueBuffer,
}

#[wasm_bindgen]
pub struct WebSession {
    inner: Session<LocalStorage>,
}

#[wasm_bindgen]
impl WebSession {
    /// `tuning_json` optionally overrides the shipped balance
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> WebSession {
        let tuning = match tuning_json.as_deref().map(Tuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Ignoring tuning override: {e}");
                Tuning::default()
            }
            None => Tuning::default(),
        };
        let seed = super::random_seed();
        WebSession {
            inner: Session::new(LocalStorage, seed, tuning),
        }
    }

    /// Difficulty name ("easy", "medium", "hard"); empty uses the preference
    pub fn start_game(&mut self, difficulty: &str) -> String {
        self.command(Command::StartGame(Difficulty::from_str(difficulty)))
    }

    /// `KeyboardEvent.key` or a numeric pad label; other keys are ignored
    pub fn key(&mut self, key: &str) -> String {
        match parse_key(key) {
            Some(token) => self.command(Command::Input(token)),
            None => self.outcome(&[]),
        }
    }

    pub fn transcript(&mut self, text: String, confidence: f32) -> String {
        self.command(Command::Transcript { text, confidence })
    }

    pub fn toggle_pause(&mut self) -> String {
        self.command(Command::TogglePause)
    }

    pub fn back_to_menu(&mut self) -> String {
        self.command(Command::BackToMenu)
    }

    pub fn show_statistics(&mut self) -> String {
        self.command(Command::ShowStatistics)
    }

    pub fn show_settings(&mut self) -> String {
        self.command(Command::ShowSettings)
    }

    pub fn reset_statistics(&mut self) -> String {
        self.command(Command::ResetStatistics)
    }

    pub fn move_player(&mut self, x: f32) {
        self.inner.handle(Command::MovePlayer(x));
    }

    pub fn resize(&mut self, width: f32) {
        self.inner.handle(Command::Resize(width));
    }

    /// Settings as JSON; malformed input is logged and ignored
    pub fn update_settings(&mut self, json: &str) {
        match serde_json::from_str(json) {
            Ok(settings) => {
                self.inner.handle(Command::UpdateSettings(settings));
            }
            Err(e) => log::warn!("Ignoring settings update: {e}"),
        }
    }

    pub fn settings(&self) -> String {
        serde_json::to_string(self.inner.settings()).unwrap_or_default()
    }

    /// Advance one animation frame (`dt` in seconds)
    pub fn update(&mut self, dt: f32) -> String {
        let events = self.inner.update(dt);
        self.outcome(&events)
    }

    pub fn snapshot(&self) -> String {
        self.inner.snapshot_json().unwrap_or_default()
    }

    /// Voice recognizer restarts requested since the last call
    pub fn take_listen_requests(&mut self) -> u32 {
        self.inner.take_listen_requests()
    }
}

impl WebSession {
    fn command(&mut self, command: Command) -> String {
        let events = self.inner.handle(command);
        self.outcome(&events)
    }

    fn outcome(&self, events: &[GameEvent]) -> String {
        let mut cues = CueBuffer::default();
        self.inner.dispatch_cues(events, &mut cues);
        serde_json::to_string(&Outcome { events, cues }).unwrap_or_default()
    }
}
