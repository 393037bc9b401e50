// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session/authorization state machine.
//!
//! Login, logout, and failed-session recovery all funnel through
//! [`SessionService::authorize`], so the "redirect if needed, else report"
//! decision lives in one place:
//!
//! ```text
//! Unauthenticated ──authorize──▶ Authorizing ──ok──▶ Authorized(identity)
//!                                     │
//!                                     └──err──▶ AuthFailed (credential cleared)
//! ```

use tracing::{debug, info, warn};

use crate::auth::AuthApi;
use crate::error::ChatError;
use crate::route::{RouteGuard, PRIVATE_ROUTE, PUBLIC_ROUTE};
use crate::store::TokenStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authorizing,
    Authorized(String),
    AuthFailed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authorizing => "authorizing",
            Self::Authorized(_) => "authorized",
            Self::AuthFailed => "auth_failed",
        }
    }
}

/// Result of an authorization pass that did not raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Authorized and already on the private route.
    Ready(String),
    /// A navigation happened. Whatever the caller planned next is superseded.
    Redirected,
}

pub struct SessionService {
    auth: Box<dyn AuthApi>,
    tokens: TokenStore,
    guard: RouteGuard,
    state: SessionState,
}

impl SessionService {
    pub fn new(auth: impl AuthApi + 'static, tokens: TokenStore, guard: RouteGuard) -> Self {
        Self { auth: Box::new(auth), tokens, guard, state: SessionState::Unauthenticated }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Username of the authorized session, if any.
    pub fn identity(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authorized(name) => Some(name),
            _ => None,
        }
    }

    /// Stored credential, used as the connection handshake parameter.
    pub fn credential(&self) -> Option<String> {
        self.tokens.get()
    }

    pub fn current_route(&self) -> String {
        self.guard.current()
    }

    /// Validate the stored credential and route accordingly.
    ///
    /// On failure the credential is cleared and the user is sent to the
    /// public route; the error is only returned when they were already there.
    pub async fn authorize(&mut self) -> Result<AuthOutcome, ChatError> {
        if self.state == SessionState::Authorizing {
            // Overlapping calls are not guarded against; an abandoned pass is
            // reported and then superseded by this one.
            warn!("previous authorization did not complete, starting a new one");
        }
        self.state = SessionState::Authorizing;

        let result = match self.tokens.get() {
            None => Err(ChatError::CredentialMissing),
            Some(token) => {
                self.auth.authorize(&token).await.map_err(ChatError::AuthorizationFailed)
            }
        };

        match result {
            Ok(identity) => {
                info!(username = %identity, "authorized");
                self.state = SessionState::Authorized(identity.clone());
                if self.guard.ensure(PRIVATE_ROUTE) {
                    Ok(AuthOutcome::Ready(identity))
                } else {
                    Ok(AuthOutcome::Redirected)
                }
            }
            Err(err) => {
                debug!(err = %err, "authorization failed");
                if let Err(e) = self.tokens.clear() {
                    warn!(err = %e, "failed to clear rejected access token");
                }
                self.state = SessionState::AuthFailed;
                if self.guard.ensure(PUBLIC_ROUTE) {
                    Err(err)
                } else {
                    Ok(AuthOutcome::Redirected)
                }
            }
        }
    }

    /// Obtain and store a new credential, then complete via [`Self::authorize`].
    pub async fn authenticate(&mut self, username: &str) -> Result<AuthOutcome, ChatError> {
        let token =
            self.auth.authenticate(username).await.map_err(ChatError::AuthenticationFailed)?;
        self.tokens.set(&token).map_err(ChatError::AuthenticationFailed)?;
        debug!(username, "credential issued");
        self.authorize().await
    }

    /// Drop the credential and fall through the failure path to the public
    /// route.
    ///
    /// If the credential cannot be removed the user is still sent to the
    /// public route, but the stale credential is never re-authorized.
    pub async fn logout(&mut self) -> Result<AuthOutcome, ChatError> {
        if let Err(e) = self.tokens.clear() {
            warn!(err = %e, "logout could not clear the stored credential");
            self.state = SessionState::AuthFailed;
            self.guard.ensure(PUBLIC_ROUTE);
            return Err(ChatError::StorageFailed(e));
        }
        info!("logged out");
        self.authorize().await
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
