// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory chat model: transcript, roster, presence.
//!
//! Mutators are crate-private; only the event dispatcher changes state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One friend and their presence. Unique by `username` within a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEntry {
    pub username: String,
    pub online: bool,
}

/// A message received over the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub text: String,
    /// Sender, when the server stamped one.
    pub from: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    roster: Vec<FriendEntry>,
    transcript: Vec<TranscriptEntry>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roster(&self) -> &[FriendEntry] {
        &self.roster
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Presence of `username`, or `None` when they are not in the roster.
    pub fn is_online(&self, username: &str) -> Option<bool> {
        self.roster.iter().find(|f| f.username == username).map(|f| f.online)
    }

    pub fn online_count(&self) -> usize {
        self.roster.iter().filter(|f| f.online).count()
    }

    pub(crate) fn append_message(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
    }

    /// Update the matching entry in place. Returns whether anything changed;
    /// unknown usernames are ignored.
    pub(crate) fn update_presence(&mut self, username: &str, online: bool) -> bool {
        match self.roster.iter_mut().find(|f| f.username == username) {
            Some(entry) if entry.online != online => {
                entry.online = online;
                true
            }
            Some(_) => false,
            None => {
                debug!(username, "presence for user not in roster");
                false
            }
        }
    }

    /// Replace the roster wholesale. Repeated usernames keep their first
    /// occurrence.
    pub(crate) fn replace_roster(&mut self, friends: Vec<FriendEntry>) {
        let mut seen = HashSet::with_capacity(friends.len());
        let mut roster = Vec::with_capacity(friends.len());
        for friend in friends {
            if !seen.insert(friend.username.clone()) {
                debug!(username = %friend.username, "duplicate roster entry dropped");
                continue;
            }
            roster.push(friend);
        }
        self.roster = roster;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
