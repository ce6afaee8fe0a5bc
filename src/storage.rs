// Key-value persistence for the planner collections.
//
// Each entity kind lives under one fixed key and its value is the full
// serialized collection. There is no schema version: content that fails to
// parse is treated as "no data" by the store layer.
use crate::context::AppContext;
use anyhow::Result;
use fs2::FileExt;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const COURSES_KEY: &str = "@courses";
pub const ASSIGNMENTS_KEY: &str = "@assignments";
pub const GRADE_COURSES_KEY: &str = "@gradeCourses";
pub const REMINDERS_KEY: &str = "@reminders";

/// External get/set-by-key store holding serialized collections.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Returns `Ok(None)` when nothing has been stored under `key` yet.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Replaces the whole value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

pub type SharedBackend = Arc<dyn KeyValueStore>;

/// File helpers shared by the file store and the config writer.
pub struct LocalStorage;

impl LocalStorage {
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive advisory lock next to `file_path`.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Writes through a temp file and renames it over `path`.
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}

/// One JSON file per key inside the context's data directory.
#[derive(Debug)]
pub struct FileStore {
    ctx: Arc<dyn AppContext>,
}

impl FileStore {
    pub fn new(ctx: Arc<dyn AppContext>) -> Self {
        Self { ctx }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.ctx.get_store_file_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        LocalStorage::with_lock(&path, || Ok(Some(fs::read_to_string(&path)?)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.ctx.get_store_file_path(key)?;
        LocalStorage::with_lock(&path, || LocalStorage::atomic_write(&path, value))
    }
}

/// In-process store, used by tests and headless front ends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Seeds raw content, bypassing serialization (e.g. to simulate corruption).
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            anyhow::bail!("Write rejected for key {}", key);
        }
        self.insert_raw(key, value);
        Ok(())
    }
}
