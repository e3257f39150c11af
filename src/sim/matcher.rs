//! Input matcher
//!
//! Maps the growing input buffer onto the most-descended problem whose
//! answer starts with it, and decides when the buffer resolves that target.

use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;
use super::problem::Problem;
use super::scoring;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::ANSWER_EPSILON;

/// One symbolic input, whatever device produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputToken {
    /// 0-9
    Digit(u8),
    /// Decimal point
    Point,
    /// Remove the last character
    Delete,
}

impl InputToken {
    /// Character appended to the buffer (None for Delete)
    pub fn as_char(self) -> Option<char> {
        match self {
            InputToken::Digit(d) if d <= 9 => char::from_digit(d as u32, 10),
            InputToken::Digit(_) | InputToken::Delete => None,
            InputToken::Point => Some('.'),
        }
    }
}

/// Display form of an answer that typed input is compared against
pub fn canonical_answer(answer: f64) -> String {
    if answer.fract() == 0.0 {
        return format!("{}", answer as i64);
    }
    let fixed = format!("{answer:.2}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// A buffer starting with the decimal point reads as `0.`
fn normalize(input: &str) -> String {
    if input.starts_with('.') {
        format!("0{input}")
    } else {
        input.to_string()
    }
}

/// Problems whose canonical answer starts with the buffer
pub fn candidates<'a>(problems: &'a [Problem], input: &str) -> impl Iterator<Item = &'a Problem> {
    let typed = normalize(input);
    problems
        .iter()
        .filter(move |p| !typed.is_empty() && canonical_answer(p.answer).starts_with(&typed))
}

/// Most-descended candidate; equal heights go to the lowest ID
pub fn find_target<'a>(problems: &'a [Problem], input: &str) -> Option<&'a Problem> {
    candidates(problems, input).max_by(|a, b| a.pos.y.total_cmp(&b.pos.y).then(b.id.cmp(&a.id)))
}

/// Whether the buffer is a complete answer for the problem
pub fn is_resolution(problem: &Problem, input: &str) -> bool {
    let typed = normalize(input);
    if canonical_answer(problem.answer) == typed {
        return true;
    }
    problem.answer.fract() != 0.0
        && !typed.ends_with('.')
        && typed
            .parse::<f64>()
            .is_ok_and(|v| (v - problem.answer).abs() < ANSWER_EPSILON)
}

/// Feed one token into the buffer while playing
pub fn apply_token(state: &mut GameState, token: InputToken) -> Vec<GameEvent> {
    if state.phase != GamePhase::Playing {
        return Vec::new();
    }

    let Some(ch) = token.as_char() else {
        if token == InputToken::Delete {
            state.input.pop();
            return retarget(state);
        }
        return Vec::new();
    };
    if ch == '.' && state.input.contains('.') {
        return Vec::new();
    }

    let mut buffer = state.input.clone();
    buffer.push(ch);

    let Some(target) = find_target(&state.problems, &buffer) else {
        log::debug!("No problem matches {buffer:?}");
        return vec![scoring::reject_input(state)];
    };
    let target_id = target.id;
    let resolved = is_resolution(target, &buffer)
        || (state.effects.is_active(PowerUpKind::RapidFire)
            && candidates(&state.problems, &buffer).count() == 1);

    if resolved {
        return scoring::resolve_correct(state, target_id);
    }

    state.input = buffer;
    retarget(state)
}

/// Recompute the target after the buffer changed
fn retarget(state: &mut GameState) -> Vec<GameEvent> {
    let previous = state.target;
    state.target = find_target(&state.problems, &state.input).map(|p| p.id);
    match state.target {
        Some(id) if previous != Some(id) => vec![GameEvent::TargetAcquired { id }],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::problem::OperatorFamily;
    use crate::sim::state::Difficulty;
    use crate::statistics::GameStatistics;
    use crate::tuning::Tuning;
    use glam::Vec2;
    use proptest::prelude::*;

    fn problem(id: u32, answer: f64, y: f32) -> Problem {
        Problem {
            id,
            text: String::new(),
            answer,
            family: OperatorFamily::Addition,
            pos: Vec2::new(100.0, y),
            speed: 20.0,
            difficulty: Difficulty::Easy,
            personality: crate::sim::problem::Personality::Friendly,
            size: crate::sim::problem::SizeClass::Small,
            hp: 1,
        }
    }

    fn board(problems: Vec<Problem>) -> GameState {
        let mut s = GameState::new(3, Tuning::default(), GameStatistics::default());
        s.start_game(Difficulty::Easy);
        s.tuning.spawn_base_chance = 0.0;
        s.tuning.spawn_chance_per_wave = 0.0;
        s.tuning.spawn_chance_per_correct = 0.0;
        s.total_in_wave = problems.len() as u32;
        s.problems = problems;
        s
    }

    fn type_str(s: &mut GameState, text: &str) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for ch in text.chars() {
            let token = match ch {
                '.' => InputToken::Point,
                d => InputToken::Digit(d.to_digit(10).unwrap() as u8),
            };
            events.extend(apply_token(s, token));
        }
        events
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(canonical_answer(12.0), "12");
        assert_eq!(canonical_answer(-4.0), "-4");
        assert_eq!(canonical_answer(0.5), "0.5");
        assert_eq!(canonical_answer(1.25), "1.25");
        assert_eq!(canonical_answer(3.1), "3.1");
    }

    #[test]
    fn test_shared_prefix_targets_most_descended() {
        let mut s = board(vec![problem(1, 12.0, 100.0), problem(2, 125.0, 300.0)]);
        let events = type_str(&mut s, "12");
        assert_eq!(s.target, Some(2));
        assert!(events.contains(&GameEvent::TargetAcquired { id: 2 }));
        assert_eq!(s.problems.len(), 2);

        type_str(&mut s, "5");
        assert!(s.problem(2).is_none());
        assert!(s.problem(1).is_some());
        assert_eq!(s.handled, 1);
    }

    #[test]
    fn test_shorter_answer_resolves_when_lower() {
        let mut s = board(vec![problem(1, 12.0, 300.0), problem(2, 125.0, 100.0)]);
        type_str(&mut s, "12");
        assert!(s.problem(1).is_none());
        assert!(s.input.is_empty());
    }

    #[test]
    fn test_equal_height_goes_to_lowest_id() {
        let problems = vec![problem(9, 44.0, 200.0), problem(4, 45.0, 200.0)];
        assert_eq!(find_target(&problems, "4").map(|p| p.id), Some(4));
    }

    #[test]
    fn test_unmatched_digit_breaks_streak() {
        let mut s = board(vec![problem(1, 12.0, 100.0)]);
        type_str(&mut s, "1");
        assert_eq!(type_str(&mut s, "9"), vec![GameEvent::InputRejected]);
        assert!(s.input.is_empty());
        assert_eq!(s.target, None);
        assert_eq!(s.statistics.total_answered(), 1);
        assert_eq!(s.statistics.current_streak(), 0);
    }

    #[test]
    fn test_leading_point_reads_as_zero() {
        let mut s = board(vec![problem(1, 0.5, 100.0)]);
        type_str(&mut s, ".");
        assert_eq!(s.target, Some(1));
        type_str(&mut s, "5");
        assert!(s.problems.is_empty());
    }

    #[test]
    fn test_decimal_answer_needs_full_digits() {
        let mut s = board(vec![problem(1, 2.25, 100.0)]);
        type_str(&mut s, "2.2");
        assert_eq!(s.problems.len(), 1);
        type_str(&mut s, "5");
        assert!(s.problems.is_empty());
    }

    #[test]
    fn test_delete_retargets() {
        let mut s = board(vec![problem(1, 31.0, 300.0), problem(2, 35.0, 100.0)]);
        type_str(&mut s, "35");
        // 35 resolved; type again toward the other
        assert!(s.problem(2).is_none());
        type_str(&mut s, "3");
        assert_eq!(s.target, Some(1));
        apply_token(&mut s, InputToken::Delete);
        assert!(s.input.is_empty());
        assert_eq!(s.target, None);
    }

    #[test]
    fn test_rapid_fire_completes_unique_prefix() {
        let mut s = board(vec![problem(1, 144.0, 300.0), problem(2, 12.0, 100.0)]);
        s.effects.activate(PowerUpKind::RapidFire, 20.0);
        // "1" matches both
        type_str(&mut s, "1");
        assert_eq!(s.problems.len(), 2);
        // "14" matches only 144
        type_str(&mut s, "4");
        assert!(s.problem(1).is_none());
    }

    #[test]
    fn test_ignored_outside_play() {
        let mut s = board(vec![problem(1, 3.0, 100.0)]);
        s.set_phase(GamePhase::Paused);
        assert!(type_str(&mut s, "3").is_empty());
        assert_eq!(s.problems.len(), 1);
    }

    #[test]
    fn test_second_point_ignored() {
        let mut s = board(vec![problem(1, 1.5, 100.0)]);
        type_str(&mut s, "1.");
        assert!(apply_token(&mut s, InputToken::Point).is_empty());
        assert_eq!(s.input, "1.");
    }

    #[test]
    fn test_wave_one_easy_lowest_problem() {
        let mut s = GameState::new(21, Tuning::default(), GameStatistics::default());
        s.start_game(Difficulty::Easy);
        s.tuning.spawn_base_chance = 0.0;
        s.tuning.spawn_chance_per_wave = 0.0;
        s.tuning.spawn_chance_per_correct = 0.0;
        let lowest = s
            .problems
            .iter()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .unwrap()
            .clone();
        let answer = canonical_answer(lowest.answer);
        let events = type_str(&mut s, &answer);

        assert!(s.problem(lowest.id).is_none());
        assert_eq!(s.score, 10);
        assert_eq!(s.handled, 1);
        assert!(events.iter().any(|e| matches!(e, GameEvent::ProblemSolved { id, .. } if *id == lowest.id)));
    }

    proptest! {
        #[test]
        fn prop_target_is_most_descended(ys in prop::collection::vec(0.0f32..500.0, 1..8)) {
            let problems: Vec<Problem> = ys
                .iter()
                .enumerate()
                .map(|(i, &y)| problem(i as u32 + 1, 70.0 + i as f64, y))
                .collect();
            let target = find_target(&problems, "7").unwrap();
            let max_y = ys.iter().cloned().fold(f32::MIN, f32::max);
            prop_assert_eq!(target.pos.y, max_y);
        }
    }
}
