//! Keyboard and on-screen pad adapters
//!
//! Every device ends up emitting the same [`InputToken`]s.

pub use crate::sim::InputToken;

/// Token for a key name (`KeyboardEvent.key`) or pad label
pub fn parse_key(key: &str) -> Option<InputToken> {
    match key {
        "." | "Decimal" => Some(InputToken::Point),
        "Backspace" | "Delete" | "⌫" => Some(InputToken::Delete),
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c.to_digit(10).map(|d| InputToken::Digit(d as u8)),
                _ => None,
            }
        }
    }
}

/// Tokens that type out a number string; other characters are skipped
pub fn tokens_for(text: &str) -> Vec<InputToken> {
    text.chars()
        .filter_map(|c| match c {
            '.' => Some(InputToken::Point),
            c => c.to_digit(10).map(|d| InputToken::Digit(d as u8)),
        })
        .collect()
}

/// On-screen numeric pad layout, row by row
pub const NUMPAD_ROWS: [&[&str]; 2] = [
    &["1", "2", "3", "4", "5"],
    &["6", "7", "8", "9", "0", ".", "⌫"],
];
