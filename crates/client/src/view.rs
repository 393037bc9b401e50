// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal rendering of the chat model.

use std::io::Write;

use crate::dispatch::Change;
use crate::state::{ChatState, FriendEntry, TranscriptEntry};

/// Presentation surface. Reads [`ChatState`]; never mutates it.
pub trait View: Send {
    /// Public route: ask for a username.
    fn login_prompt(&mut self);

    /// Private route loaded for `username`.
    fn greet(&mut self, username: &str);

    /// Redraw whatever `change` touched.
    fn render(&mut self, change: Change, state: &ChatState);

    /// Redraw the whole roster.
    fn roster(&mut self, state: &ChatState);

    /// Inline error text in the current view.
    fn error(&mut self, message: &str);

    /// The connection closed; show the server's reason.
    fn closed(&mut self, reason: &str);
}

/// Line-oriented view over any writer (stdout in the binary).
pub struct TerminalView<W: Write + Send> {
    out: W,
    /// Transcript entries already printed.
    printed: usize,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    fn login_prompt(&mut self) {
        self.printed = 0;
        let _ = write!(self.out, "username: ");
        let _ = self.out.flush();
    }

    fn greet(&mut self, username: &str) {
        self.printed = 0;
        self.line(&format!("Hi {username}"));
    }

    fn render(&mut self, change: Change, state: &ChatState) {
        match change {
            Change::Transcript => {
                // Print only what is new so re-renders are idempotent.
                let fresh: Vec<String> =
                    state.transcript().iter().skip(self.printed).map(format_message).collect();
                self.printed = state.transcript().len();
                for line in fresh {
                    self.line(&line);
                }
            }
            Change::Roster => self.roster(state),
            Change::Nothing => {}
        }
    }

    fn roster(&mut self, state: &ChatState) {
        let lines: Vec<String> = state.roster().iter().map(format_friend).collect();
        self.line(&format!("-- friends ({} online) --", state.online_count()));
        for line in lines {
            self.line(&line);
        }
    }

    fn error(&mut self, message: &str) {
        self.line(&format!("error: {message}"));
    }

    fn closed(&mut self, reason: &str) {
        if reason.is_empty() {
            self.line("connection closed");
        } else {
            self.line(&format!("connection closed: {reason}"));
        }
    }
}

pub fn format_message(entry: &TranscriptEntry) -> String {
    match &entry.from {
        Some(from) => format!("{from}: {}", entry.text),
        None => entry.text.clone(),
    }
}

pub fn format_friend(friend: &FriendEntry) -> String {
    let presence = if friend.online { "online" } else { "offline" };
    format!("{} {presence}", friend.username)
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
