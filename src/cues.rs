//! Sound and haptic cues
//!
//! The core never plays audio itself. Events are mapped to discrete cue
//! keys and handed to a [`CueSink`] implemented by the frontend.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::{GameEvent, Personality};

/// Sound effect keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundCue {
    /// Friendly/neutral problem destroyed
    Destroy,
    DestroyAggressive,
    DestroyBoss,
    TargetAcquired,
    PowerUp,
    LoseLife,
    WaveComplete,
}

/// Vibration intensity hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HapticHint {
    Light,
    Medium,
    Heavy,
    PowerUp,
    /// Streak milestone
    Streak,
}

/// Receives cues; implementations must not block
pub trait CueSink {
    /// Play a sound at `volume` (0.0 - 1.0)
    fn sound(&mut self, cue: SoundCue, volume: f32);
    fn haptic(&mut self, hint: HapticHint);
}

/// Sound for an event, if any
pub fn sound_for(event: &GameEvent) -> Option<SoundCue> {
    match event {
        GameEvent::ProblemSolved { personality, .. } => Some(match personality {
            Personality::Friendly | Personality::Neutral => SoundCue::Destroy,
            Personality::Aggressive => SoundCue::DestroyAggressive,
            Personality::Boss => SoundCue::DestroyBoss,
        }),
        GameEvent::ProblemHit { .. } | GameEvent::ProblemsCleared { .. } => Some(SoundCue::Destroy),
        GameEvent::TargetAcquired { .. } => Some(SoundCue::TargetAcquired),
        GameEvent::PowerUpCollected { .. } => Some(SoundCue::PowerUp),
        GameEvent::ProblemMissed { life_lost: true, .. } => Some(SoundCue::LoseLife),
        GameEvent::WaveCleared { .. } => Some(SoundCue::WaveComplete),
        _ => None,
    }
}

/// Haptic hint for an event, if any. Streak milestones every `streak_step`.
pub fn haptic_for(event: &GameEvent, streak_step: u32) -> Option<HapticHint> {
    match event {
        GameEvent::ProblemSolved { streak, .. } if streak_step > 0 && *streak > 0 && streak % streak_step == 0 => {
            Some(HapticHint::Streak)
        }
        GameEvent::ProblemSolved { personality, .. } => Some(match personality {
            Personality::Friendly | Personality::Neutral => HapticHint::Light,
            Personality::Aggressive => HapticHint::Medium,
            Personality::Boss => HapticHint::Heavy,
        }),
        GameEvent::ProblemHit { .. } => Some(HapticHint::Light),
        GameEvent::PowerUpCollected { .. } => Some(HapticHint::PowerUp),
        GameEvent::ProblemMissed { life_lost: true, .. } | GameEvent::ProblemsCleared { .. } => {
            Some(HapticHint::Heavy)
        }
        GameEvent::WaveCleared { .. } => Some(HapticHint::Medium),
        _ => None,
    }
}

/// Route events to a sink, honoring the player's toggles
pub fn dispatch(events: &[GameEvent], settings: &Settings, streak_step: u32, sink: &mut dyn CueSink) {
    let volume = settings.effective_sfx_volume();
    for event in events {
        if volume > 0.0
            && let Some(cue) = sound_for(event)
        {
            sink.sound(cue, volume);
        }
        if settings.haptics
            && let Some(hint) = haptic_for(event, streak_step)
        {
            sink.haptic(hint);
        }
    }
}

/// Sink that only logs (headless runs)
#[derive(Debug, Default)]
pub struct LogSink;

impl CueSink for LogSink {
    fn sound(&mut self, cue: SoundCue, volume: f32) {
        log::trace!("sound {cue:?} at {volume:.2}");
    }

    fn haptic(&mut self, hint: HapticHint) {
        log::trace!("haptic {hint:?}");
    }
}
