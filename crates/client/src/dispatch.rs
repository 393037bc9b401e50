// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event dispatch: applies inbound events to [`ChatState`].

use tracing::{debug, warn};

use crate::error::ProtocolViolation;
use crate::protocol::{FriendsFetched, InboundEvent, MessageSent, PresenceNotified};
use crate::state::{ChatState, TranscriptEntry};

/// What a handled event changed, so the view knows what to redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Transcript,
    Roster,
    Nothing,
}

/// Routes inbound events to their handlers. Counts handled frames and
/// protocol violations for diagnostics.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    handled: u64,
    violations: u64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handled(&self) -> u64 {
        self.handled
    }

    pub fn violations(&self) -> u64 {
        self.violations
    }

    /// Apply one typed event.
    pub fn dispatch(&mut self, state: &mut ChatState, event: InboundEvent) -> Change {
        self.handled += 1;
        match event {
            InboundEvent::MessageSent(msg) => message_sent(state, msg),
            InboundEvent::PresenceNotified(presence) => presence_notified(state, presence),
            InboundEvent::FriendsFetched(fetched) => friends_fetched(state, fetched),
        }
    }

    /// Decode and apply one raw text frame. A violation is fatal to this
    /// frame only: state is left untouched and the caller keeps reading.
    pub fn dispatch_raw(
        &mut self,
        state: &mut ChatState,
        raw: &str,
    ) -> Result<Change, ProtocolViolation> {
        match InboundEvent::decode(raw) {
            Ok(event) => {
                debug!(kind = event.kind(), "inbound event");
                Ok(self.dispatch(state, event))
            }
            Err(violation) => {
                self.violations += 1;
                warn!(err = %violation, "dropping inbound frame");
                Err(violation)
            }
        }
    }
}

fn message_sent(state: &mut ChatState, msg: MessageSent) -> Change {
    state.append_message(TranscriptEntry { text: msg.text, from: msg.from });
    Change::Transcript
}

fn presence_notified(state: &mut ChatState, presence: PresenceNotified) -> Change {
    if state.update_presence(&presence.username, presence.online) {
        Change::Roster
    } else {
        Change::Nothing
    }
}

fn friends_fetched(state: &mut ChatState, fetched: FriendsFetched) -> Change {
    state.replace_roster(fetched.friends);
    Change::Roster
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
