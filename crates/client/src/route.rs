// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route enforcement: keeps unauthorized sessions off the private route.

use std::sync::{Arc, Mutex};

use tracing::debug;

/// Login page.
pub const PUBLIC_ROUTE: &str = "/";

/// Chat page, reachable only with an authorized session.
pub const PRIVATE_ROUTE: &str = "/chat";

/// Source and sink of the current location.
pub trait Navigator: Send + Sync {
    fn current(&self) -> String;

    /// Replace the current location (no history entry).
    fn replace(&self, path: &str);
}

/// In-process location. Clones share the same path, so the app loop can
/// observe navigations performed deep inside the session layer.
#[derive(Debug, Clone)]
pub struct Location {
    inner: Arc<Mutex<LocationState>>,
}

#[derive(Debug)]
struct LocationState {
    path: String,
    navigations: u64,
}

impl Location {
    pub fn new(path: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LocationState { path: path.to_owned(), navigations: 0 })),
        }
    }

    /// Number of navigations performed so far.
    pub fn navigations(&self) -> u64 {
        self.lock().navigations
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LocationState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(PUBLIC_ROUTE)
    }
}

impl Navigator for Location {
    fn current(&self) -> String {
        self.lock().path.clone()
    }

    fn replace(&self, path: &str) {
        let mut state = self.lock();
        state.path = path.to_owned();
        state.navigations += 1;
    }
}

/// Idempotent navigation primitive.
pub struct RouteGuard {
    navigator: Box<dyn Navigator>,
}

impl RouteGuard {
    pub fn new(navigator: impl Navigator + 'static) -> Self {
        Self { navigator: Box::new(navigator) }
    }

    /// Returns `true` when already at `path`. Otherwise navigates there and
    /// returns `false`; the caller is superseded by the navigation.
    pub fn ensure(&self, path: &str) -> bool {
        if self.navigator.current() == path {
            return true;
        }
        debug!(to = path, "redirecting");
        self.navigator.replace(path);
        false
    }

    pub fn current(&self) -> String {
        self.navigator.current()
    }
}

#[cfg(test)]
#[path = "route_tests.rs"]
mod tests;
