// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Terminal client for the chat server.
#[derive(Debug, Clone, Parser)]
#[command(name = "chatline", version, about)]
pub struct Config {
    /// Chat server base URL (HTTP; the WebSocket URL is derived from it).
    #[arg(long, env = "CHATLINE_SERVER", default_value = "http://127.0.0.1:4000")]
    pub server: String,

    /// Log in as this user instead of prompting.
    #[arg(long, env = "CHATLINE_USERNAME")]
    pub username: Option<String>,

    /// File holding the stored access token.
    #[arg(long, env = "CHATLINE_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Keep the access token in memory only.
    #[arg(long)]
    pub ephemeral: bool,

    /// WebSocket keepalive ping interval in seconds (0 disables).
    #[arg(long, env = "CHATLINE_PING_INTERVAL", default_value_t = 30)]
    pub ping_interval_secs: u64,

    /// Timeout for authentication HTTP calls in seconds.
    #[arg(long, env = "CHATLINE_HTTP_TIMEOUT", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Log format (json or text).
    #[arg(long, env = "CHATLINE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "CHATLINE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.server.starts_with("http://") || self.server.starts_with("https://")) {
            anyhow::bail!("--server must be an http:// or https:// URL, got: {}", self.server);
        }
        if let Some(ref name) = self.username {
            if name.trim().is_empty() {
                anyhow::bail!("--username must not be empty");
            }
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Token file, defaulting to `$HOME/.chatline/token.json`.
    pub fn token_path(&self) -> PathBuf {
        if let Some(ref path) = self.token_file {
            return path.clone();
        }
        let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| ".".into());
        home.join(".chatline").join("token.json")
    }

    /// `None` when keepalive pings are disabled.
    pub fn ping_interval(&self) -> Option<Duration> {
        (self.ping_interval_secs > 0).then(|| Duration::from_secs(self.ping_interval_secs))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
