//! Player statistics
//!
//! Running totals that survive between sessions. Persisted through
//! [`crate::persistence`]; derived values (accuracy, best streak) are only
//! ever recomputed from the counters, never set directly.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Storage};

/// Achievement thresholds
pub const STREAK_MASTER: u32 = 10;
pub const SCHOLAR: u32 = 100;
pub const SHARPSHOOTER: u32 = 90;
pub const HIGH_SCORER: u64 = 1000;

/// Running statistics
///
/// Serializes with the derived accuracy alongside the counters; the extra
/// field is ignored when reading a record back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, into = "StatisticsRecord")]
pub struct GameStatistics {
    current_streak: u32,
    best_streak: u32,
    total_answered: u32,
    correct_answers: u32,
    high_score: u64,
    time_played_secs: u64,
}

/// Stored and snapshot form of [`GameStatistics`]
#[derive(Serialize)]
struct StatisticsRecord {
    current_streak: u32,
    best_streak: u32,
    total_answered: u32,
    correct_answers: u32,
    accuracy: u32,
    high_score: u64,
    time_played_secs: u64,
}

impl From<GameStatistics> for StatisticsRecord {
    fn from(stats: GameStatistics) -> Self {
        Self {
            accuracy: stats.accuracy(),
            current_streak: stats.current_streak,
            best_streak: stats.best_streak,
            total_answered: stats.total_answered,
            correct_answers: stats.correct_answers,
            high_score: stats.high_score,
            time_played_secs: stats.time_played_secs,
        }
    }
}

/// Unlocked achievements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Achievements {
    pub streak_master: bool,
    pub scholar: bool,
    pub sharpshooter: bool,
    pub high_scorer: bool,
}

impl GameStatistics {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "math_fall_statistics";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn total_answered(&self) -> u32 {
        self.total_answered
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn time_played_secs(&self) -> u64 {
        self.time_played_secs
    }

    /// Rounded percentage of correct answers (0 when nothing answered)
    pub fn accuracy(&self) -> u32 {
        if self.total_answered == 0 {
            return 0;
        }
        (self.correct_answers as f64 / self.total_answered as f64 * 100.0).round() as u32
    }

    /// One correct answer: streak grows, best streak follows
    pub fn record_correct(&mut self) {
        self.current_streak += 1;
        self.total_answered += 1;
        self.correct_answers += 1;
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    /// Problems cleared by an effect count as correct without touching the streak
    pub fn record_credited(&mut self, count: u32) {
        self.total_answered += count;
        self.correct_answers += count;
    }

    /// A rejected input or a missed problem
    pub fn record_miss(&mut self) {
        self.current_streak = 0;
        self.total_answered += 1;
    }

    /// Start of a new game
    pub fn reset_streak(&mut self) {
        self.current_streak = 0;
    }

    /// Merge the final score and played time at game over.
    /// Returns true if the score is a new high score.
    pub fn finalize(&mut self, score: u64, played_secs: u64) -> bool {
        let new_high = score > self.high_score;
        self.high_score = self.high_score.max(score);
        self.time_played_secs += played_secs;
        new_high
    }

    /// Answers per minute of play, one decimal
    pub fn questions_per_minute(&self) -> f64 {
        if self.time_played_secs == 0 {
            return 0.0;
        }
        let qpm = self.total_answered as f64 / (self.time_played_secs as f64 / 60.0);
        (qpm * 10.0).round() / 10.0
    }

    pub fn achievements(&self) -> Achievements {
        Achievements {
            streak_master: self.best_streak >= STREAK_MASTER,
            scholar: self.total_answered >= SCHOLAR,
            sharpshooter: self.accuracy() >= SHARPSHOOTER,
            high_scorer: self.high_score >= HIGH_SCORER,
        }
    }

    /// Load from storage, zeroed if absent or unreadable
    pub fn load(storage: &dyn Storage) -> Self {
        persistence::load_json(storage, Self::STORAGE_KEY)
    }

    /// Save to storage (failures are logged, not returned)
    pub fn save(&self, storage: &mut dyn Storage) {
        persistence::save_json(storage, Self::STORAGE_KEY, self);
    }
}

/// Format played time as `1h 2m 3s` / `2m 3s`
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else {
        format!("{mins}m {secs}s")
    }
}
