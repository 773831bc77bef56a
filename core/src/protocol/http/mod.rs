/*
 * mod.rs
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

//! HTTP/1.1 client over a pluggable byte-stream transport.
//!
//! One `connect()` is one connection: the request is sent when the transport becomes ready,
//! the response is read until the peer closes, and the handler sees zero or more `data`
//! calls followed by exactly one `complete`.

mod handler;
mod request;
mod response;

pub mod client;
pub mod connection;
pub mod error;
pub mod h1;
pub mod timer;
pub mod transport;

pub use client::HttpClient;
pub use connection::{ConnectionPhase, HttpConnection, PendingRequest, MAX_RECEIVE_LEN};
pub use error::{ConnectionError, TransportError};
pub use handler::{CallbackHandler, ConnectionHandler};
pub use request::{frame_request, merge_headers, Method, REQUIRED_HEADERS};
pub use response::{HttpResponse, ResponseMode};
pub use timer::DeadlineTimer;
pub use transport::{
    ReceiveCompletion, SendCompletion, StateHandler, TlsOptions, Transport, TransportParameters,
    TransportProvider, TransportState,
};
