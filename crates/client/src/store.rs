// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential storage: a blocking key-value store holding the access token.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Key under which the access token is stored.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Synchronous key-value store, the client-side equivalent of browser local
/// storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> R) -> R {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.with(|m| m.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.with(|m| m.insert(key.to_owned(), value.to_owned()));
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.with(|m| m.remove(key));
        Ok(())
    }
}

/// JSON-file store: one flat object of string values, rewritten atomically
/// on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write tmp + rename so a crash never leaves a truncated file behind.
    fn save(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Unique per save (PID + counter), so concurrent saves never share a
    /// temp file.
    fn tmp_path(&self) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        self.path.with_file_name(tmp_name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Holds at most one access credential. Absence means unauthenticated.
pub struct TokenStore {
    backend: Box<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self { backend: Box::new(backend) }
    }

    /// Current credential. A store that cannot be read counts as empty.
    pub fn get(&self) -> Option<String> {
        match self.backend.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(err = %e, "token store unreadable, treating as signed out");
                None
            }
        }
    }

    pub fn set(&self, token: &str) -> anyhow::Result<()> {
        self.backend.set(ACCESS_TOKEN_KEY, token)
    }

    /// Remove the credential.
    pub fn clear(&self) -> anyhow::Result<()> {
        self.backend.remove(ACCESS_TOKEN_KEY)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
