// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes and helpers shared by unit and integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::auth::{AuthApi, AuthFuture};
use crate::route::{Location, RouteGuard};
use crate::session::SessionService;
use crate::state::FriendEntry;
use crate::store::{MemoryStore, TokenStore};

/// Assert that an expression is `Err` and its message contains `substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

#[derive(Debug, Default)]
struct FakeAuthState {
    /// token -> username
    issued: HashMap<String, String>,
    reject_authenticate: bool,
    authenticate_calls: u32,
    authorize_calls: u32,
}

/// In-memory [`AuthApi`]: issues `token-<username>` and accepts only tokens
/// it issued (or was seeded with). Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeAuth {
    inner: Arc<Mutex<FakeAuthState>>,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a token the server will accept.
    pub fn with_token(self, token: &str, username: &str) -> Self {
        self.lock().issued.insert(token.to_owned(), username.to_owned());
        self
    }

    /// Make every `authenticate` call fail.
    pub fn rejecting_authenticate(self) -> Self {
        self.lock().reject_authenticate = true;
        self
    }

    /// Invalidate a previously issued token (e.g. expiry).
    pub fn revoke(&self, token: &str) {
        self.lock().issued.remove(token);
    }

    pub fn authenticate_calls(&self) -> u32 {
        self.lock().authenticate_calls
    }

    pub fn authorize_calls(&self) -> u32 {
        self.lock().authorize_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeAuthState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AuthApi for FakeAuth {
    fn authenticate<'a>(&'a self, username: &'a str) -> AuthFuture<'a, String> {
        let result = {
            let mut state = self.lock();
            state.authenticate_calls += 1;
            if state.reject_authenticate {
                Err(anyhow::anyhow!("400 Bad Request"))
            } else {
                let token = format!("token-{username}");
                state.issued.insert(token.clone(), username.to_owned());
                Ok(token)
            }
        };
        Box::pin(async move { result })
    }

    fn authorize<'a>(&'a self, token: &'a str) -> AuthFuture<'a, String> {
        let result = {
            let mut state = self.lock();
            state.authorize_calls += 1;
            state.issued.get(token).cloned().ok_or_else(|| anyhow::anyhow!("401 Unauthorized"))
        };
        Box::pin(async move { result })
    }
}

/// A session wired to in-memory collaborators, with handles to observe them.
pub struct SessionFixture {
    pub session: SessionService,
    pub auth: FakeAuth,
    pub store: MemoryStore,
    pub location: Location,
}

impl SessionFixture {
    pub fn new(auth: FakeAuth, start_path: &str) -> Self {
        let store = MemoryStore::new();
        let location = Location::new(start_path);
        let session = SessionService::new(
            auth.clone(),
            TokenStore::new(store.clone()),
            RouteGuard::new(location.clone()),
        );
        Self { session, auth, store, location }
    }

    /// Stored access token, bypassing the session.
    pub fn stored_token(&self) -> Option<String> {
        TokenStore::new(self.store.clone()).get()
    }

    pub fn store_token(&self, token: &str) -> anyhow::Result<()> {
        TokenStore::new(self.store.clone()).set(token)
    }
}

pub fn friend(username: &str, online: bool) -> FriendEntry {
    FriendEntry { username: username.to_owned(), online }
}
