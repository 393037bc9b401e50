// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application loop: login page, chat page, logout.
//!
//! The current route picks the page. Session operations navigate; the loop
//! re-reads the route after each one, so a redirect abandons whatever the
//! page was doing.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::{ConnectionEvent, ConnectionManager};
use crate::dispatch::{Change, EventDispatcher};
use crate::error::{ChatError, ErrorCode, ProtocolViolation};
use crate::protocol::OutboundEvent;
use crate::route::PRIVATE_ROUTE;
use crate::session::{AuthOutcome, SessionService};
use crate::state::ChatState;
use crate::view::View;

/// Everything scoped to one authorized, connected session. Dropped on
/// logout or disconnect, taking the connection and chat state with it.
pub struct ChatSession {
    identity: String,
    credential: String,
    connection: ConnectionManager,
    state: ChatState,
    dispatcher: EventDispatcher,
}

/// Result of reading the next frame of a [`ChatSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Changed(Change),
    Violation(ProtocolViolation),
    Closed(String),
}

impl ChatSession {
    /// Connect as `identity`, presenting `credential` at the handshake.
    pub async fn open(
        server_url: &str,
        identity: &str,
        credential: &str,
    ) -> Result<Self, ChatError> {
        let mut connection = ConnectionManager::new(server_url);
        connection.connect(credential).await?;
        Ok(Self {
            identity: identity.to_owned(),
            credential: credential.to_owned(),
            connection,
            state: ChatState::new(),
            dispatcher: EventDispatcher::new(),
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Await the next inbound frame and apply it.
    pub async fn next_update(&mut self) -> SessionUpdate {
        match self.connection.next_event().await {
            ConnectionEvent::Frame(raw) => {
                match self.dispatcher.dispatch_raw(&mut self.state, &raw) {
                    Ok(change) => SessionUpdate::Changed(change),
                    Err(violation) => SessionUpdate::Violation(violation),
                }
            }
            ConnectionEvent::Closed(reason) => SessionUpdate::Closed(reason),
        }
    }

    /// Send a chat message. Blank text and a closed connection both yield
    /// `false`.
    pub async fn send_text(&mut self, text: &str) -> bool {
        match OutboundEvent::send_message(text) {
            Some(event) => self.connection.send(&event).await,
            None => false,
        }
    }

    pub async fn ping(&mut self) -> bool {
        self.connection.ping().await
    }

    pub async fn close(mut self) {
        self.connection.close().await;
    }
}

/// How a run of the application ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppExit {
    /// The user quit (command, end of input, or interrupt).
    Quit,
    /// The connection closed; reconnecting requires a new run.
    Disconnected(String),
    /// A failure with no recovery path (e.g. login rejected non-interactively).
    Failed(String),
}

impl AppExit {
    pub fn code(&self) -> i32 {
        match self {
            Self::Quit => 0,
            Self::Disconnected(_) | Self::Failed(_) => 1,
        }
    }
}

enum ChatExit {
    Quit,
    LoggedOut,
    Disconnected(String),
}

/// User commands typed on the chat page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Logout,
    Friends,
    Say(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/quit" => Self::Quit,
            "/logout" => Self::Logout,
            "/friends" => Self::Friends,
            _ => Self::Say(line),
        }
    }
}

/// Drives the pages for one process run.
pub struct App<'v> {
    server_url: String,
    username: Option<String>,
    ping_interval: Option<Duration>,
    session: SessionService,
    view: &'v mut dyn View,
    input: mpsc::Receiver<String>,
    shutdown: CancellationToken,
}

impl<'v> App<'v> {
    pub fn new(
        server_url: &str,
        session: SessionService,
        view: &'v mut dyn View,
        input: mpsc::Receiver<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            server_url: server_url.to_owned(),
            username: None,
            ping_interval: None,
            session,
            view,
            input,
            shutdown,
        }
    }

    /// Log in as `username` without prompting.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_ping_interval(mut self, interval: Option<Duration>) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    pub async fn run(&mut self) -> AppExit {
        loop {
            let exit = if self.session.current_route() == PRIVATE_ROUTE {
                self.chat_page().await
            } else {
                self.login_page().await
            };
            if let Some(exit) = exit {
                info!(?exit, "exiting");
                return exit;
            }
        }
    }

    /// Returns `None` when a navigation happened and the loop should re-route.
    async fn login_page(&mut self) -> Option<AppExit> {
        // A stored credential skips the form.
        match self.session.authorize().await {
            Ok(_) => return None,
            Err(e) => debug!(err = %e, "no usable session on login page"),
        }

        let (username, interactive) = match self.username.take() {
            Some(name) => (name, false),
            None => {
                self.view.login_prompt();
                match self.read_line().await {
                    Some(line) => (line.trim().to_owned(), true),
                    None => return Some(AppExit::Quit),
                }
            }
        };
        match Command::parse(&username) {
            Command::Quit => return Some(AppExit::Quit),
            Command::Say(name) if !name.is_empty() => {}
            _ => return None,
        }

        match self.session.authenticate(&username).await {
            Ok(_) => None,
            Err(e) => {
                self.view.error(&e.to_string());
                if interactive {
                    None
                } else {
                    Some(AppExit::Failed(e.to_string()))
                }
            }
        }
    }

    async fn chat_page(&mut self) -> Option<AppExit> {
        let identity = match self.session.authorize().await {
            Ok(AuthOutcome::Ready(identity)) => identity,
            Ok(AuthOutcome::Redirected) => return None,
            Err(e) => {
                self.view.error(&e.to_string());
                return Some(AppExit::Failed(e.to_string()));
            }
        };
        self.view.greet(&identity);

        let credential = self.session.credential()?;
        let chat = match ChatSession::open(&self.server_url, &identity, &credential).await {
            Ok(chat) => chat,
            Err(e) => {
                self.view.error(&e.to_string());
                return Some(AppExit::Disconnected(e.to_string()));
            }
        };

        match self.chat_loop(chat).await {
            ChatExit::Quit => Some(AppExit::Quit),
            ChatExit::Disconnected(reason) => Some(AppExit::Disconnected(reason)),
            ChatExit::LoggedOut => match self.session.logout().await {
                Ok(_) => None,
                Err(e) if e.code() == ErrorCode::StorageFailed => {
                    // The credential is still stored; the login page would
                    // authorize it straight back.
                    self.view.error(&e.to_string());
                    Some(AppExit::Failed(e.to_string()))
                }
                Err(e) => {
                    // Already on the public route; nothing redirected us.
                    debug!(err = %e, "logout landed on login page");
                    None
                }
            },
        }
    }

    /// Single-threaded event loop: one inbound frame or one input line at a
    /// time, each handled to completion.
    async fn chat_loop(&mut self, mut chat: ChatSession) -> ChatExit {
        let ping_enabled = self.ping_interval.is_some();
        let mut ping =
            tokio::time::interval(self.ping_interval.unwrap_or(Duration::from_secs(3600)));
        ping.tick().await; // First tick is immediate.

        loop {
            tokio::select! {
                update = chat.next_update() => match update {
                    SessionUpdate::Changed(change) => self.view.render(change, chat.state()),
                    SessionUpdate::Violation(violation) => {
                        self.view.error(&ChatError::from(violation).to_string());
                    }
                    SessionUpdate::Closed(reason) => {
                        self.view.closed(&reason);
                        return ChatExit::Disconnected(reason);
                    }
                },

                line = self.input.recv() => {
                    let Some(line) = line else {
                        chat.close().await;
                        return ChatExit::Quit;
                    };
                    match Command::parse(&line) {
                        Command::Quit => {
                            chat.close().await;
                            return ChatExit::Quit;
                        }
                        Command::Logout => {
                            chat.close().await;
                            return ChatExit::LoggedOut;
                        }
                        Command::Friends => self.view.roster(chat.state()),
                        Command::Say(text) => {
                            if !text.trim().is_empty() && !chat.send_text(text).await {
                                self.view.error("message not sent: not connected");
                            }
                        }
                    }
                }

                _ = ping.tick(), if ping_enabled => {
                    chat.ping().await;
                }

                _ = self.shutdown.cancelled() => {
                    chat.close().await;
                    return ChatExit::Quit;
                }
            }
        }
    }

    async fn read_line(&mut self) -> Option<String> {
        tokio::select! {
            line = self.input.recv() => line,
            _ = self.shutdown.cancelled() => None,
        }
    }
}

/// Forward stdin lines into a channel until EOF.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    use tokio::io::AsyncBufReadExt;

    let (tx, rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
