//! Persistence of small JSON records
//!
//! Features:
//! - Opaque key/value [`Storage`] seam (memory, files, LocalStorage)
//! - Read failures fall back to `Default` with a warning
//! - Write failures are logged, never propagated

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

/// Opaque get/set store for serialized records
pub trait Storage {
    /// Read a record; `None` if absent or unreadable
    fn get_item(&self, key: &str) -> Option<String>;
    /// Write a record; returns false if the write failed
    fn set_item(&mut self, key: &str, value: &str) -> bool;
}

/// In-memory storage (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        self.items.insert(key.to_string(), value.to_string());
        true
    }
}

/// Load a JSON record, defaulting when missing or corrupt
pub fn load_json<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    let Some(json) = storage.get_item(key) else {
        log::info!("No stored {key}, starting fresh");
        return T::default();
    };
    match serde_json::from_str(&json) {
        Ok(value) => {
            log::info!("Loaded {key}");
            value
        }
        Err(e) => {
            log::warn!("Stored {key} unreadable ({e}), using defaults");
            T::default()
        }
    }
}

/// Save a JSON record (fire-and-forget)
pub fn save_json<T: Serialize + ?Sized>(storage: &mut dyn Storage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if storage.set_item(key, &json) {
                log::debug!("Saved {key}");
            } else {
                log::warn!("Failed to write {key}");
            }
        }
        Err(e) => log::warn!("Failed to serialize {key}: {e}"),
    }
}
