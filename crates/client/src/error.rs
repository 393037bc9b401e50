// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Machine-readable error codes shared by the session, protocol, and
/// connection layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    CredentialMissing,
    AuthorizationFailed,
    AuthenticationFailed,
    ProtocolViolation,
    TransportClosed,
    AlreadyConnected,
    ConnectFailed,
    StorageFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "CREDENTIAL_MISSING",
            Self::AuthorizationFailed => "AUTHORIZATION_FAILED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::ProtocolViolation => "PROTOCOL_VIOLATION",
            Self::TransportClosed => "TRANSPORT_CLOSED",
            Self::AlreadyConnected => "ALREADY_CONNECTED",
            Self::ConnectFailed => "CONNECT_FAILED",
            Self::StorageFailed => "STORAGE_FAILED",
        }
    }

    /// Whether the session layer recovers from this error by clearing the
    /// credential and routing to the public page.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::CredentialMissing | Self::AuthorizationFailed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound frame that does not fit the agreed event contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// The frame's `type` names no known event kind.
    UnhandledEventKind(String),
    /// The kind is known but its payload does not match the kind's shape.
    MalformedPayload { kind: String, reason: String },
    /// The frame is not a `{type, payload}` JSON object at all.
    MalformedFrame(String),
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnhandledEventKind(kind) => write!(f, "unhandled event kind: {kind}"),
            Self::MalformedPayload { kind, reason } => {
                write!(f, "malformed {kind} payload: {reason}")
            }
            Self::MalformedFrame(reason) => write!(f, "malformed frame: {reason}"),
        }
    }
}

impl std::error::Error for ProtocolViolation {}

/// Errors surfaced by the chat client core.
#[derive(Debug)]
pub enum ChatError {
    /// No credential is stored.
    CredentialMissing,
    /// The server rejected the credential, or the authorize call failed.
    AuthorizationFailed(anyhow::Error),
    /// The authenticate call failed before a credential was issued.
    AuthenticationFailed(anyhow::Error),
    Protocol(ProtocolViolation),
    /// The connection was closed by the server or the network.
    TransportClosed(String),
    /// `connect` was called while a connection is already open.
    AlreadyConnected,
    /// The WebSocket handshake failed.
    ConnectFailed(String),
    /// The credential store could not be written.
    StorageFailed(anyhow::Error),
}

impl ChatError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::CredentialMissing => ErrorCode::CredentialMissing,
            Self::AuthorizationFailed(_) => ErrorCode::AuthorizationFailed,
            Self::AuthenticationFailed(_) => ErrorCode::AuthenticationFailed,
            Self::Protocol(_) => ErrorCode::ProtocolViolation,
            Self::TransportClosed(_) => ErrorCode::TransportClosed,
            Self::AlreadyConnected => ErrorCode::AlreadyConnected,
            Self::ConnectFailed(_) => ErrorCode::ConnectFailed,
            Self::StorageFailed(_) => ErrorCode::StorageFailed,
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialMissing => f.write_str("access token is required"),
            Self::AuthorizationFailed(e) => write!(f, "authorization failed: {e:#}"),
            Self::AuthenticationFailed(e) => write!(f, "authentication failed: {e:#}"),
            Self::Protocol(v) => write!(f, "protocol violation: {v}"),
            Self::TransportClosed(reason) if reason.is_empty() => {
                f.write_str("connection closed")
            }
            Self::TransportClosed(reason) => write!(f, "connection closed: {reason}"),
            Self::AlreadyConnected => f.write_str("a connection is already open"),
            Self::ConnectFailed(reason) => write!(f, "connect failed: {reason}"),
            Self::StorageFailed(e) => write!(f, "credential store failed: {e:#}"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<ProtocolViolation> for ChatError {
    fn from(v: ProtocolViolation) -> Self {
        Self::Protocol(v)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
