// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the authentication endpoints.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Boxed future returned by [`AuthApi`] calls.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Credential issuance and validation.
///
/// Object-safe for use as `Box<dyn AuthApi>`.
pub trait AuthApi: Send + Sync {
    /// Exchange a username for an access token.
    fn authenticate<'a>(&'a self, username: &'a str) -> AuthFuture<'a, String>;

    /// Validate an access token and return the username it belongs to.
    fn authorize<'a>(&'a self, token: &'a str) -> AuthFuture<'a, String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub username: String,
}

/// `reqwest`-backed [`AuthApi`] talking to `POST /authenticate` and
/// `POST /authorize`.
pub struct HttpAuthClient {
    base_url: String,
    client: Client,
}

impl HttpAuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        install_crypto_provider();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_owned(), client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl AuthApi for HttpAuthClient {
    fn authenticate<'a>(&'a self, username: &'a str) -> AuthFuture<'a, String> {
        Box::pin(async move {
            let body = AuthenticateRequest { username: username.to_owned() };
            let resp = self.client.post(self.url("/authenticate")).json(&body).send().await?;
            let credential: Credential = resp.error_for_status()?.json().await?;
            if credential.access_token.is_empty() {
                anyhow::bail!("server issued an empty access token");
            }
            Ok(credential.access_token)
        })
    }

    fn authorize<'a>(&'a self, token: &'a str) -> AuthFuture<'a, String> {
        Box::pin(async move {
            let resp = self.client.post(self.url("/authorize")).bearer_auth(token).send().await?;
            let user: AuthorizedUser = resp.error_for_status()?.json().await?;
            Ok(user.username)
        })
    }
}

/// Install the process-wide rustls provider. Later calls are no-ops.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
