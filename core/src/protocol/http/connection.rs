/*
 * connection.rs
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

//! HTTP connection: one transport, one request, one response. Drives the transport through
//! its lifecycle, frames and sends the request on Ready, accumulates the response and hands
//! it to the parser when the peer closes, then reports completion exactly once.
//!
//! State handling:
//! - Setup, Preparing: nothing.
//! - Ready: send the request (once) and start the receive loop.
//! - Waiting: ignored, unless the network is down, which cancels without reporting an error.
//! - Failed: report `Connection(cause)`, then cancel.
//! - Cancelled: disarm the deadline, call `complete`, detach from the transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::protocol::http::error::{ConnectionError, TransportError};
use crate::protocol::http::h1::parse_response;
use crate::protocol::http::handler::ConnectionHandler;
use crate::protocol::http::request::{frame_request, Method};
use crate::protocol::http::response::{HttpResponse, ResponseMode};
use crate::protocol::http::timer::DeadlineTimer;
use crate::protocol::http::transport::{StateHandler, Transport, TransportState};
use crate::queue::EventQueue;
use crate::uri::Url;

/// Largest single read requested from the transport.
pub const MAX_RECEIVE_LEN: usize = u16::MAX as usize;

/// Last transport state the connection observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Setup,
    Preparing,
    Ready,
    Waiting,
    Failed,
    Cancelled,
}

impl From<&TransportState> for ConnectionPhase {
    fn from(state: &TransportState) -> Self {
        match state {
            TransportState::Setup => ConnectionPhase::Setup,
            TransportState::Preparing => ConnectionPhase::Preparing,
            TransportState::Ready => ConnectionPhase::Ready,
            TransportState::Waiting(_) => ConnectionPhase::Waiting,
            TransportState::Failed(_) => ConnectionPhase::Failed,
            TransportState::Cancelled => ConnectionPhase::Cancelled,
        }
    }
}

/// What to send once the transport is ready.
pub struct PendingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<Vec<u8>>,
}

impl PendingRequest {
    fn frame(&self) -> Vec<u8> {
        frame_request(
            self.method,
            &self.url,
            self.headers.as_ref(),
            self.body.as_deref(),
        )
    }
}

struct ConnectionState {
    phase: ConnectionPhase,
    sent: bool,
    terminated: bool,
    buffer: BytesMut,
    timer: Option<DeadlineTimer>,
}

struct ConnectionInner {
    transport: Arc<dyn Transport>,
    request: PendingRequest,
    mode: ResponseMode,
    state: Mutex<ConnectionState>,
    /// Taken when `complete` is called; no `data` after that.
    handler: Mutex<Option<Box<dyn ConnectionHandler>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle on a running connection. Dropping it does not cancel the connection.
#[derive(Clone)]
pub struct HttpConnection {
    inner: Arc<ConnectionInner>,
}

impl HttpConnection {
    /// Wire `handler` to `transport`, arm the deadline and start the transport on `queue`.
    pub fn open(
        transport: Arc<dyn Transport>,
        request: PendingRequest,
        mode: ResponseMode,
        queue: EventQueue,
        timeout: Duration,
        handler: Box<dyn ConnectionHandler>,
    ) -> Self {
        let inner = Arc::new(ConnectionInner {
            transport: transport.clone(),
            request,
            mode,
            state: Mutex::new(ConnectionState {
                phase: ConnectionPhase::Setup,
                sent: false,
                terminated: false,
                buffer: BytesMut::new(),
                timer: None,
            }),
            handler: Mutex::new(Some(handler)),
        });

        let events = inner.clone();
        let state_handler: StateHandler =
            Arc::new(move |state: TransportState| events.on_state(state));
        transport.set_state_handler(Some(state_handler));

        let weak: Weak<ConnectionInner> = Arc::downgrade(&inner);
        let timer = DeadlineTimer::arm(queue.handle(), timeout, move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_deadline();
            }
        });
        lock(&inner.state).timer = Some(timer);

        log::debug!(
            "[http] {} {} (timeout {:?})",
            inner.request.method.as_str(),
            inner.request.url.as_str(),
            timeout
        );
        transport.start(queue);
        Self { inner }
    }

    pub fn phase(&self) -> ConnectionPhase {
        lock(&self.inner.state).phase
    }

    /// True once `complete` has been delivered.
    pub fn is_terminated(&self) -> bool {
        lock(&self.inner.state).terminated
    }

    /// Ask the transport to cancel; completion follows when it reports `Cancelled`.
    pub fn cancel(&self) {
        if !self.is_terminated() {
            self.inner.transport.cancel();
        }
    }
}

impl ConnectionInner {
    fn on_state(self: &Arc<Self>, state: TransportState) {
        {
            let mut st = lock(&self.state);
            if st.terminated {
                log::debug!("[http] ignoring {:?} after cancellation", state);
                return;
            }
            st.phase = ConnectionPhase::from(&state);
        }
        match state {
            TransportState::Setup | TransportState::Preparing => {}
            TransportState::Ready => self.on_ready(),
            TransportState::Waiting(cause) => {
                if cause.is_network_down() {
                    log::warn!("[http] {}: {}, cancelling", self.request.url.host(), cause);
                    self.transport.cancel();
                } else {
                    log::debug!("[http] {}: waiting: {}", self.request.url.host(), cause);
                }
            }
            TransportState::Failed(cause) => {
                log::warn!("[http] {}: failed: {}", self.request.url.host(), cause);
                self.deliver(Err(ConnectionError::Connection(cause)));
                self.transport.cancel();
            }
            TransportState::Cancelled => self.finish(),
        }
    }

    fn on_ready(self: &Arc<Self>) {
        {
            let mut st = lock(&self.state);
            if st.sent {
                return;
            }
            st.sent = true;
        }
        let content = self.request.frame();
        log::debug!(
            "[http] {}: sending {} bytes",
            self.request.url.host(),
            content.len()
        );
        let inner = self.clone();
        self.transport.send(
            content,
            Box::new(move |error: Option<TransportError>| {
                if let Some(cause) = error {
                    inner.on_send_failed(cause);
                }
            }),
        );
        self.receive_next();
    }

    fn on_send_failed(&self, cause: TransportError) {
        if self.is_terminated() {
            return;
        }
        log::warn!("[http] {}: send failed: {}", self.request.url.host(), cause);
        self.deliver(Err(ConnectionError::Send(cause)));
        self.transport.cancel();
    }

    /// Issue the next read. Only called from a read completion (or once on Ready), so at
    /// most one read is outstanding.
    fn receive_next(self: &Arc<Self>) {
        if self.is_terminated() {
            return;
        }
        let inner = self.clone();
        self.transport.receive(
            1,
            MAX_RECEIVE_LEN,
            Box::new(
                move |data: Option<Bytes>, is_complete: bool, error: Option<TransportError>| {
                    inner.on_receive(data, is_complete, error)
                },
            ),
        );
    }

    fn on_receive(
        self: &Arc<Self>,
        data: Option<Bytes>,
        is_complete: bool,
        error: Option<TransportError>,
    ) {
        let complete_buffer = {
            let mut st = lock(&self.state);
            if st.terminated {
                log::debug!("[http] dropping read completion after cancellation");
                return;
            }
            if let Some(data) = data.as_ref() {
                st.buffer.extend_from_slice(data);
            }
            if is_complete {
                Some(std::mem::take(&mut st.buffer).freeze())
            } else {
                None
            }
        };

        if let Some(buffer) = complete_buffer {
            let response = parse_response(&buffer, self.mode);
            log::debug!(
                "[http] {}: {} bytes, status {:?}",
                self.request.url.host(),
                buffer.len(),
                response.status_code
            );
            self.deliver(Ok(response));
            self.transport.cancel();
        } else if let Some(cause) = error {
            log::warn!("[http] {}: receive failed: {}", self.request.url.host(), cause);
            self.deliver(Err(ConnectionError::Receive(Some(cause))));
            self.transport.cancel();
        } else {
            self.receive_next();
        }
    }

    fn on_deadline(&self) {
        if self.is_terminated() {
            return;
        }
        log::warn!("[http] {}: deadline exceeded, cancelling", self.request.url.host());
        self.transport.cancel();
    }

    fn is_terminated(&self) -> bool {
        lock(&self.state).terminated
    }

    fn deliver(&self, result: Result<HttpResponse, ConnectionError>) {
        if let Some(handler) = lock(&self.handler).as_mut() {
            handler.data(result);
        }
    }

    fn finish(&self) {
        let timer = {
            let mut st = lock(&self.state);
            if st.terminated {
                return;
            }
            st.terminated = true;
            st.phase = ConnectionPhase::Cancelled;
            st.buffer.clear();
            st.timer.take()
        };
        if let Some(timer) = timer {
            timer.disarm();
        }
        let handler = lock(&self.handler).take();
        if let Some(mut handler) = handler {
            handler.complete();
        }
        log::debug!("[http] {}: cancelled", self.request.url.host());
        self.transport.set_state_handler(None);
    }
}
