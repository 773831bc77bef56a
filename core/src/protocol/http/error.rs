/*
 * error.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pinhttp, a certificate-pinning HTTP/1.1 client.
 *
 * Pinhttp is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pinhttp is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pinhttp.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Connection and transport errors.
//!
//! Configuration errors (`BadUrl`, `NegativeTimeout`, `TimeoutOutOfBounds`) are returned
//! synchronously from `connect()`. Everything else is delivered through the data callback.

use std::fmt;
use std::io;

/// Cause reported by a transport (socket, TLS or name resolution failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No usable network path (ENETDOWN / ENETUNREACH). The only fatal `Waiting` cause.
    NetworkDown,
    /// Socket level failure.
    Io { kind: io::ErrorKind, message: String },
    /// TLS handshake or record layer failure, including certificate rejection.
    Tls(String),
    /// Host name could not be resolved.
    Dns(String),
}

impl TransportError {
    pub fn io(kind: io::ErrorKind, message: impl Into<String>) -> Self {
        Self::Io {
            kind,
            message: message.into(),
        }
    }

    /// True for the cause that turns a `Waiting` state into a cancellation.
    pub fn is_network_down(&self) -> bool {
        matches!(self, TransportError::NetworkDown)
    }
}

#[cfg(unix)]
fn is_network_down_errno(code: i32) -> bool {
    code == libc::ENETDOWN || code == libc::ENETUNREACH
}

#[cfg(not(unix))]
fn is_network_down_errno(_code: i32) -> bool {
    false
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        if e.raw_os_error().map(is_network_down_errno).unwrap_or(false) {
            return TransportError::NetworkDown;
        }
        TransportError::Io {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NetworkDown => write!(f, "network is down"),
            TransportError::Io { message, .. } => write!(f, "{}", message),
            TransportError::Tls(m) => write!(f, "tls: {}", m),
            TransportError::Dns(m) => write!(f, "dns: {}", m),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors surfaced by `HttpClient::connect` and its data callback.
#[derive(Debug, Clone)]
pub enum ConnectionError {
    /// URL without scheme or host.
    BadUrl(String),
    /// Transport reported `Failed`.
    Connection(TransportError),
    NegativeTimeout,
    /// Timeout is NaN, infinite or too large to schedule.
    TimeoutOutOfBounds,
    Receive(Option<TransportError>),
    Send(TransportError),
    Wait(TransportError),
    Unknown(String),
}

impl ConnectionError {
    /// Configuration errors are raised before a transport exists.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ConnectionError::BadUrl(_)
                | ConnectionError::NegativeTimeout
                | ConnectionError::TimeoutOutOfBounds
        )
    }
}

// Unknown causes are opaque: any two compare equal.
impl PartialEq for ConnectionError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConnectionError::BadUrl(a), ConnectionError::BadUrl(b)) => a == b,
            (ConnectionError::Connection(a), ConnectionError::Connection(b)) => a == b,
            (ConnectionError::Receive(a), ConnectionError::Receive(b)) => a == b,
            (ConnectionError::Send(a), ConnectionError::Send(b)) => a == b,
            (ConnectionError::Wait(a), ConnectionError::Wait(b)) => a == b,
            (ConnectionError::Unknown(_), ConnectionError::Unknown(_)) => true,
            (ConnectionError::NegativeTimeout, ConnectionError::NegativeTimeout) => true,
            (ConnectionError::TimeoutOutOfBounds, ConnectionError::TimeoutOutOfBounds) => true,
            _ => false,
        }
    }
}

impl Eq for ConnectionError {}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::BadUrl(url) => write!(f, "bad url: {}", url),
            ConnectionError::Connection(e) => write!(f, "connection failed: {}", e),
            ConnectionError::NegativeTimeout => write!(f, "timeout must not be negative"),
            ConnectionError::TimeoutOutOfBounds => write!(f, "timeout out of bounds"),
            ConnectionError::Receive(Some(e)) => write!(f, "receive failed: {}", e),
            ConnectionError::Receive(None) => write!(f, "receive failed"),
            ConnectionError::Send(e) => write!(f, "send failed: {}", e),
            ConnectionError::Wait(e) => write!(f, "connection waiting: {}", e),
            ConnectionError::Unknown(m) => write!(f, "unknown error: {}", m),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Connection(e)
            | ConnectionError::Send(e)
            | ConnectionError::Wait(e)
            | ConnectionError::Receive(Some(e)) => Some(e),
            _ => None,
        }
    }
}
