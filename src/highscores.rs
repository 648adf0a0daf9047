//! Persist the all-time highest combo (XDG config or ~/.config/tilestacktui).

use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const FILENAME: &str = "highest_combo";
const APP_DIR: &str = "tilestacktui";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not save highest combo to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the all-time best combo lives between sessions.
///
/// `read` never fails: anything unreadable counts as "no record yet" (0).
pub trait HighScoreStore {
    fn read(&mut self) -> u32;
    fn write(&mut self, combo: u32) -> Result<(), StoreError>;
}

/// Default location: `$XDG_CONFIG_HOME/tilestacktui/highest_combo`, falling back to
/// `~/.config/...` and finally the working directory.
pub fn default_path() -> PathBuf {
    let home_config = || {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home_config(),
    };
    base.join(APP_DIR).join(FILENAME)
}

/// Single plain-text integer on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HighScoreStore for FileStore {
    fn read(&mut self) -> u32 {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }

    fn write(&mut self, combo: u32) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, combo.to_string()).map_err(io_err)
    }
}

/// Best combo kept for the lifetime of the process (`--no-save`).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: u32,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn with_value(value: u32) -> Self {
        Self { value }
    }
}

impl HighScoreStore for MemoryStore {
    fn read(&mut self) -> u32 {
        self.value
    }

    fn write(&mut self, combo: u32) -> Result<(), StoreError> {
        self.value = combo;
        Ok(())
    }
}

/// Store chosen at startup: on disk, or memory-only for `--no-save`.
#[derive(Debug, Clone)]
pub enum Store {
    File(FileStore),
    Memory(MemoryStore),
}

impl HighScoreStore for Store {
    fn read(&mut self) -> u32 {
        match self {
            Self::File(s) => s.read(),
            Self::Memory(s) => s.read(),
        }
    }

    fn write(&mut self, combo: u32) -> Result<(), StoreError> {
        match self {
            Self::File(s) => s.write(combo),
            Self::Memory(s) => s.write(combo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_zero() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nope"));
        assert_eq!(store.read(), 0);
    }

    #[test]
    fn test_write_creates_dirs_and_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);
        let mut store = FileStore::new(&path);
        store.write(12).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "12");
        assert_eq!(store.read(), 12);
    }

    #[test]
    fn test_garbage_reads_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        fs::write(&path, "seven\n").unwrap();
        assert_eq!(FileStore::new(&path).read(), 0);
        fs::write(&path, " 9\n").unwrap();
        assert_eq!(FileStore::new(&path).read(), 9);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        let path = dir.path().join(FILENAME);
        fs::create_dir(&path).unwrap();
        let mut store = FileStore::new(&path);
        assert!(matches!(store.write(3), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_memory_store_keeps_last_write() {
        let mut store = MemoryStore::default();
        assert_eq!(store.read(), 0);
        store.write(5).unwrap();
        store.write(6).unwrap();
        assert_eq!(store.read(), 6);
    }

    #[test]
    fn test_store_enum_delegates() {
        let dir = tempdir().unwrap();
        let mut file = Store::File(FileStore::new(dir.path().join(FILENAME)));
        file.write(8).unwrap();
        assert_eq!(file.read(), 8);

        let mut mem = Store::Memory(MemoryStore::with_value(2));
        assert_eq!(mem.read(), 2);
    }
}
