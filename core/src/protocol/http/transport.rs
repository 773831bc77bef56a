/*
 * transport.rs
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

//! Transport seam: a byte-stream connection that reports lifecycle states and performs
//! callback-style send/receive. The connection state machine only talks to this trait, so
//! tests substitute a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::protocol::http::error::TransportError;
use crate::queue::EventQueue;
use crate::tls::CertificateValidator;

/// Lifecycle states reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportState {
    Setup,
    Preparing,
    Ready,
    /// Connection cannot proceed right now; may recover unless the cause is fatal.
    Waiting(TransportError),
    Failed(TransportError),
    /// Terminal. Reported once, after `cancel()`.
    Cancelled,
}

/// Receives state changes. Invoked on the transport's event queue.
pub type StateHandler = Arc<dyn Fn(TransportState) + Send + Sync>;

/// Called once when a send has been handed to the network, with the error if it failed.
pub type SendCompletion = Box<dyn FnOnce(Option<TransportError>) + Send>;

/// Called once per receive: data (if any), whether the stream is complete, and any error.
pub type ReceiveCompletion = Box<dyn FnOnce(Option<Bytes>, bool, Option<TransportError>) + Send>;

/// TLS options for a transport.
#[derive(Clone)]
pub struct TlsOptions {
    /// Decides trust during the handshake.
    pub validator: Arc<dyn CertificateValidator>,
}

/// Parameters handed to the provider.
#[derive(Clone)]
pub struct TransportParameters {
    /// None for plain TCP.
    pub tls: Option<TlsOptions>,
    /// Bound on establishing the connection. Zero means unbounded.
    pub connection_timeout: Duration,
}

/// Live byte-stream connection.
///
/// State changes and completions are always dispatched on the queue passed to `start`,
/// never from inside a call to `start`, `send`, `receive` or `cancel`.
pub trait Transport: Send + Sync {
    /// Install (or clear) the state sink.
    fn set_state_handler(&self, handler: Option<StateHandler>);

    /// Begin connecting; events and completions are delivered on `queue`.
    fn start(&self, queue: EventQueue);

    fn send(&self, content: Vec<u8>, completion: SendCompletion);

    /// Read between `min_len` and `max_len` bytes (fewer at end of stream).
    fn receive(&self, min_len: usize, max_len: usize, completion: ReceiveCompletion);

    /// Tear down. The transport reports `Cancelled` once, however often this is called.
    fn cancel(&self);
}

/// Creates transports.
pub trait TransportProvider: Send + Sync {
    fn make_transport(
        &self,
        host: &str,
        port: u16,
        params: TransportParameters,
    ) -> Arc<dyn Transport>;
}
