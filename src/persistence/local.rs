//! Browser LocalStorage backend (wasm32 only)

use super::Storage;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        match Self::storage() {
            Some(storage) => storage.set_item(key, value).is_ok(),
            None => {
                log::warn!("LocalStorage unavailable");
                false
            }
        }
    }
}
