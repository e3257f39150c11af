//! Player settings and preferences
//!
//! Persisted separately from statistics under their own storage key.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Storage};
use crate::sim::Difficulty;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty preselected on the menu
    pub difficulty: Difficulty,

    // === Audio ===
    /// Sound cues on/off
    pub sound: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Feedback ===
    /// Vibration hints on devices that support them
    pub haptics: bool,
    /// Explosions, particles and flashes
    pub visual_effects: bool,
    /// Reduced motion (minimize shake, flashes)
    pub reduced_motion: bool,

    // === Voice input ===
    pub voice_input: bool,
    /// BCP 47 tag handed to the recognizer
    pub voice_language: String,
    /// Transcripts below this confidence are dropped (0.0 - 1.0)
    pub voice_confidence: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,

            sound: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,

            haptics: true,
            visual_effects: true,
            reduced_motion: false,

            voice_input: false,
            voice_language: "en-US".to_string(),
            voice_confidence: 0.5,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "math_fall_settings";

    /// Volume applied to sound cues (0 when sound is off)
    pub fn effective_sfx_volume(&self) -> f32 {
        if !self.sound {
            return 0.0;
        }
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// Effective visual effects (respects reduced_motion)
    pub fn effective_visual_effects(&self) -> bool {
        self.visual_effects && !self.reduced_motion
    }

    /// Clamp values that may have been hand-edited out of range
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.voice_confidence = self.voice_confidence.clamp(0.0, 1.0);
        self
    }

    /// Load settings, defaults if absent or unreadable
    pub fn load(storage: &dyn Storage) -> Self {
        let settings: Self = persistence::load_json(storage, Self::STORAGE_KEY);
        settings.sanitized()
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        persistence::save_json(storage, Self::STORAGE_KEY, self);
        log::info!("Settings saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_round_trip_through_storage() {
        let mut storage = MemoryStorage::default();
        let settings = Settings {
            difficulty: Difficulty::Hard,
            voice_input: true,
            ..Default::default()
        };
        settings.save(&mut storage);
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let mut storage = MemoryStorage::default();
        storage.set_item(Settings::STORAGE_KEY, r#"{ "sound": false }"#);
        let settings = Settings::load(&storage);
        assert!(!settings.sound);
        assert_eq!(settings.voice_language, "en-US");
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let mut storage = MemoryStorage::default();
        storage.set_item(Settings::STORAGE_KEY, r#"{ "master_volume": 3.0, "voice_confidence": -1.0 }"#);
        let settings = Settings::load(&storage);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.voice_confidence, 0.0);
    }

    #[test]
    fn test_sound_off_silences() {
        let settings = Settings {
            sound: false,
            ..Default::default()
        };
        assert_eq!(settings.effective_sfx_volume(), 0.0);
        assert!((Settings::default().effective_sfx_volume() - 0.8).abs() < 1e-6);
    }
}
