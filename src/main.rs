//! Math Fall entry point
//!
//! The browser build is driven from JavaScript through `platform::web`.
//! Natively this runs a headless autoplay session: a bot types the answer of
//! the most-descended problem one keystroke at a time and chases power-ups.
//!
//! Usage: `math-fall [easy|medium|hard] [seed] [max-seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use math_fall::consts::SIM_DT;
    use math_fall::cues::LogSink;
    use math_fall::persistence::FileStorage;
    use math_fall::platform::{self, input::tokens_for};
    use math_fall::sim::{Difficulty, GameEvent, GamePhase, canonical_answer, find_target};
    use math_fall::statistics::format_time;
    use math_fall::{Command, Session, Tuning};

    /// Seconds between bot keystrokes
    const KEYSTROKE_INTERVAL: f32 = 0.3;

    platform::init_logging();
    log::info!("Math Fall (native) starting...");

    let mut args = std::env::args().skip(1);
    let difficulty = args
        .next()
        .and_then(|s| Difficulty::from_str(&s))
        .unwrap_or_default();
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(platform::random_seed);
    let max_seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(600.0);

    let data_dir = std::env::var("MATH_FALL_DATA").unwrap_or_else(|_| ".math-fall".to_string());
    let mut session = Session::new(FileStorage::new(data_dir), seed, Tuning::default());
    let mut sink = LogSink;

    let events = session.handle(Command::StartGame(Some(difficulty)));
    session.dispatch_cues(&events, &mut sink);

    let mut since_key = 0.0;
    let mut elapsed = 0.0;
    let mut solved = 0u32;
    while elapsed < max_seconds && session.state.phase != GamePhase::GameOver {
        let mut events = session.update(SIM_DT);
        elapsed += SIM_DT;
        since_key += SIM_DT;

        if let Some(power_up) = session.state.power_ups.iter().max_by(|a, b| a.pos.y.total_cmp(&b.pos.y)) {
            let x = power_up.pos.x;
            events.extend(session.handle(Command::MovePlayer(x)));
        }

        if session.state.phase == GamePhase::Playing && since_key >= KEYSTROKE_INTERVAL {
            since_key = 0.0;
            // Continue the current target, or aim at the lowest problem
            let answer = find_target(&session.state.problems, &session.state.input)
                .or_else(|| session.state.problems.iter().max_by(|a, b| a.pos.y.total_cmp(&b.pos.y)))
                .map(|p| canonical_answer(p.answer));
            if let Some(answer) = answer {
                let typed = if answer.starts_with(&session.state.input) { session.state.input.len() } else { 0 };
                if let Some(&token) = tokens_for(&answer[typed..]).first() {
                    events.extend(session.handle(Command::Input(token)));
                }
            }
        }

        solved += events.iter().filter(|e| matches!(e, GameEvent::ProblemSolved { .. })).count() as u32;
        session.dispatch_cues(&events, &mut sink);
    }

    let stats = &session.state.statistics;
    log::info!(
        "Finished {} run (seed {seed}): wave {}, score {}, solved {solved}, lives {}",
        difficulty.as_str(),
        session.state.wave,
        session.state.score,
        session.state.lives,
    );
    log::info!(
        "Totals: {} answered, {}% accuracy, best streak {}, high score {}, played {}",
        stats.total_answered(),
        stats.accuracy(),
        stats.best_streak(),
        stats.high_score(),
        format_time(stats.time_played_secs()),
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
