// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol: `{"type": ..., "payload": {...}}` JSON envelopes.
//!
//! Inbound kinds form a closed set ([`InboundEvent`]). A frame naming any
//! other kind is a protocol violation, as is a known kind whose payload does
//! not fit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolViolation;
use crate::state::FriendEntry;

/// Untyped envelope as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn parse(raw: &str) -> Result<Self, ProtocolViolation> {
        serde_json::from_str(raw).map_err(|e| ProtocolViolation::MalformedFrame(e.to_string()))
    }
}

// -- Server -> Client --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundEvent {
    MessageSent(MessageSent),
    PresenceNotified(PresenceNotified),
    FriendsFetched(FriendsFetched),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceNotified {
    pub username: String,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendsFetched {
    #[serde(default)]
    pub friends: Vec<FriendEntry>,
}

impl InboundEvent {
    /// Every inbound kind this client understands.
    pub const KINDS: [&'static str; 3] = ["message_sent", "presence_notified", "friends_fetched"];

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MessageSent(_) => "message_sent",
            Self::PresenceNotified(_) => "presence_notified",
            Self::FriendsFetched(_) => "friends_fetched",
        }
    }

    /// Decode one raw text frame.
    pub fn decode(raw: &str) -> Result<Self, ProtocolViolation> {
        Self::try_from(Envelope::parse(raw)?)
    }
}

impl TryFrom<Envelope> for InboundEvent {
    type Error = ProtocolViolation;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        if !Self::KINDS.contains(&envelope.kind.as_str()) {
            return Err(ProtocolViolation::UnhandledEventKind(envelope.kind));
        }
        // A bare `{"type": ...}` carries an empty payload.
        let payload = match envelope.payload {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        let tagged = serde_json::json!({ "type": &envelope.kind, "payload": payload });
        serde_json::from_value(tagged).map_err(|e| ProtocolViolation::MalformedPayload {
            kind: envelope.kind,
            reason: e.to_string(),
        })
    }
}

// -- Client -> Server --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    SendMessage(SendMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub text: String,
}

impl OutboundEvent {
    /// Encode a "send message" intent. Blank text produces nothing.
    pub fn send_message(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self::SendMessage(SendMessage { text: text.to_owned() }))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "send_message",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
