//! Voice transcript adapter
//!
//! Turns a recognizer transcript into the tokens of the last number spoken.
//! Number words are folded the usual English way ("one hundred forty four",
//! "twenty-two", "three point five").

use super::input::{InputToken, tokens_for};
use crate::settings::Settings;

fn small_number(word: &str) -> Option<u64> {
    let n = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(n)
}

/// Number being assembled from consecutive words
#[derive(Default)]
struct Phrase {
    total: u64,
    current: u64,
    seen: bool,
    /// Set once the value no longer fits; the phrase is then dropped
    overflowed: bool,
    fraction: Option<String>,
}

impl Phrase {
    fn add(&mut self, value: u64) -> bool {
        if let Some(fraction) = &mut self.fraction {
            fraction.push_str(&value.to_string());
            return true;
        }
        // "twenty two" joins, "two two" does not
        let joins = !self.seen
            || (value < 10 && self.current % 100 >= 20 && self.current % 10 == 0)
            || (self.current % 100 == 0 && self.current > 0)
            || (self.current == 0 && self.total > 0);
        if !joins {
            return false;
        }
        self.set_current(self.current.checked_add(value));
        self.seen = true;
        true
    }

    fn set_current(&mut self, value: Option<u64>) {
        match value {
            Some(v) => self.current = v,
            None => self.overflowed = true,
        }
    }

    fn hundred(&mut self) {
        self.set_current(self.current.max(1).checked_mul(100));
        self.seen = true;
    }

    fn thousand(&mut self) {
        match self.current.max(1).checked_mul(1000).and_then(|v| self.total.checked_add(v)) {
            Some(total) => self.total = total,
            None => self.overflowed = true,
        }
        self.current = 0;
        self.seen = true;
    }

    fn finish(self) -> Option<String> {
        if !self.seen || self.overflowed {
            return None;
        }
        let whole = self.total.checked_add(self.current)?.to_string();
        match self.fraction {
            Some(f) if !f.is_empty() => Some(format!("{whole}.{f}")),
            _ => Some(whole),
        }
    }
}

fn flush(phrase: &mut Phrase, numbers: &mut Vec<String>) {
    numbers.extend(std::mem::take(phrase).finish());
}

/// Every number in the transcript, in order of appearance
pub fn numbers_in(transcript: &str) -> Vec<String> {
    let text = transcript.to_lowercase().replace('-', " ");
    let mut numbers = Vec::new();
    let mut phrase = Phrase::default();

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?'));
        if word.is_empty() {
            continue;
        }

        if let Ok(value) = word.parse::<u64>() {
            if !phrase.add(value) {
                flush(&mut phrase, &mut numbers);
                phrase.add(value);
            }
            continue;
        }
        if word.parse::<f64>().is_ok() && word.chars().all(|c| c.is_ascii_digit() || c == '.') {
            flush(&mut phrase, &mut numbers);
            numbers.push(word.to_string());
            continue;
        }

        match word {
            "point" | "dot" if phrase.fraction.is_none() => {
                phrase.seen = true;
                phrase.fraction = Some(String::new());
            }
            "hundred" if phrase.fraction.is_none() => phrase.hundred(),
            "thousand" if phrase.fraction.is_none() => phrase.thousand(),
            "and" if phrase.seen && phrase.fraction.is_none() => {}
            w => match small_number(w) {
                Some(value) => {
                    if !phrase.add(value) {
                        flush(&mut phrase, &mut numbers);
                        phrase.add(value);
                    }
                }
                None => flush(&mut phrase, &mut numbers),
            },
        }
    }
    flush(&mut phrase, &mut numbers);
    numbers
}

/// The last number in the transcript, as typed text
pub fn final_number(transcript: &str) -> Option<String> {
    numbers_in(transcript).pop()
}

/// Tokens for a recognizer result; empty when voice is off or confidence is
/// below the player's threshold
pub fn transcript_tokens(transcript: &str, confidence: f32, settings: &Settings) -> Vec<InputToken> {
    if !settings.voice_input {
        return Vec::new();
    }
    if confidence < settings.voice_confidence {
        log::debug!("Dropping transcript {transcript:?} (confidence {confidence:.2})");
        return Vec::new();
    }
    match final_number(transcript) {
        Some(number) => {
            log::debug!("Voice input {transcript:?} -> {number}");
            tokens_for(&number)
        }
        None => Vec::new(),
    }
}
