//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging backend
//! - Input devices (keyboard, numeric pad, voice transcripts)
//! - The browser-facing session handle (wasm32)

pub mod input;
pub mod voice;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the log backend for this target. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}

/// Fresh run seed from the OS / browser entropy source
pub fn random_seed() -> u64 {
    rand::random()
}
