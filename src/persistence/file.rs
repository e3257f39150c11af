//! File-backed storage for native builds: one `<key>.json` per record

use std::fs;
use std::path::PathBuf;

use super::Storage;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                None
            }
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            log::warn!("Failed to create {}: {e}", self.dir.display());
            return false;
        }
        // Write-then-rename so a crash never leaves a half-written record
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        let result = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            log::warn!("Failed to write {}: {e}", path.display());
            return false;
        }
        true
    }
}
