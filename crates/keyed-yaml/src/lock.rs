/*
 * lock.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-path mutual exclusion for documents sharing one file.
//!
//! A [`LockRegistry`] is created once by the application and shared by
//! reference. Acquire the lock for a path before `load()` and drop the
//! guard after `save()`. Entries are reference counted and disappear once
//! nobody holds or waits for them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::trace;

#[derive(Debug, Default)]
struct LockEntry {
    held: bool,
    waiters: usize,
}

/// Registry of path-keyed locks.
#[derive(Debug, Default)]
pub struct LockRegistry {
    entries: Mutex<HashMap<PathBuf, LockEntry>>,
    released: Condvar,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `path` is free, then take it.
    pub fn lock(&self, path: impl AsRef<Path>) -> PathLock<'_> {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries();
        entries.entry(path.clone()).or_default().waiters += 1;

        loop {
            let entry = entries.entry(path.clone()).or_default();
            if !entry.held {
                entry.held = true;
                entry.waiters -= 1;
                break;
            }
            entries = self
                .released
                .wait(entries)
                .unwrap_or_else(PoisonError::into_inner);
        }

        trace!(path = %path.display(), "Acquired path lock");
        PathLock {
            registry: self,
            path,
        }
    }

    /// Take the lock for `path` if nobody holds it.
    pub fn try_lock(&self, path: impl AsRef<Path>) -> Option<PathLock<'_>> {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries();
        let entry = entries.entry(path.clone()).or_default();
        if entry.held {
            return None;
        }
        entry.held = true;
        Some(PathLock {
            registry: self,
            path,
        })
    }

    /// Number of paths currently held or waited for.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, LockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, path: &Path) {
        {
            let mut entries = self.entries();
            if let Some(entry) = entries.get_mut(path) {
                entry.held = false;
                if entry.waiters == 0 {
                    entries.remove(path);
                }
            }
        }
        self.released.notify_all();
        trace!(path = %path.display(), "Released path lock");
    }
}

/// Guard for a held path lock; dropping it releases the lock.
#[derive(Debug)]
pub struct PathLock<'r> {
    registry: &'r LockRegistry,
    path: PathBuf,
}

impl PathLock<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathLock<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.path);
    }
}
