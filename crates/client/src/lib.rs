// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod app;
pub mod auth;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod route;
pub mod session;
pub mod state;
pub mod store;
pub mod test_support;
pub mod view;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::{App, AppExit};
use crate::auth::HttpAuthClient;
use crate::config::Config;
use crate::route::{Location, RouteGuard};
use crate::session::SessionService;
use crate::store::{FileStore, MemoryStore, TokenStore};
use crate::view::TerminalView;

/// Wire the terminal client from `config` and run it to completion.
pub async fn run(config: Config) -> anyhow::Result<AppExit> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let auth = HttpAuthClient::new(&config.server, config.http_timeout())?;
    let tokens = if config.ephemeral {
        TokenStore::new(MemoryStore::new())
    } else {
        let path = config.token_path();
        info!(path = %path.display(), "using token file");
        TokenStore::new(FileStore::new(path))
    };
    let session = SessionService::new(auth, tokens, RouteGuard::new(Location::default()));

    let mut view = TerminalView::new(std::io::stdout());
    let input = app::spawn_stdin_reader();
    let mut app = App::new(&config.server, session, &mut view, input, shutdown)
        .with_username(config.username.clone())
        .with_ping_interval(config.ping_interval());

    Ok(app.run().await)
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGTERM"),
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGINT"),
        }
        shutdown.cancel();
    });
}
