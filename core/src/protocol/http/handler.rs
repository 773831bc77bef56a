/*
 * handler.rs
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

//! Connection handler trait (callback-based results).
//!
//! Events: data (×0..n) → complete (×1).

use crate::protocol::http::error::ConnectionError;
use crate::protocol::http::response::HttpResponse;

/// Receives the outcome of one `connect()`. The connection drives this from its event queue.
///
/// `data` carries the parsed response or an asynchronous error; it may be called several
/// times (an error followed by nothing else is typical of failures). `complete` is called
/// exactly once, after every `data` call, when the connection has been torn down.
pub trait ConnectionHandler: Send {
    fn data(&mut self, result: Result<HttpResponse, ConnectionError>);

    fn complete(&mut self);
}

/// Adapts a pair of closures to `ConnectionHandler`.
pub struct CallbackHandler<D, C> {
    on_data: D,
    on_complete: Option<C>,
}

impl<D, C> CallbackHandler<D, C>
where
    D: FnMut(Result<HttpResponse, ConnectionError>) + Send,
    C: FnOnce() + Send,
{
    pub fn new(on_data: D, on_complete: C) -> Self {
        Self {
            on_data,
            on_complete: Some(on_complete),
        }
    }
}

impl<D, C> ConnectionHandler for CallbackHandler<D, C>
where
    D: FnMut(Result<HttpResponse, ConnectionError>) + Send,
    C: FnOnce() + Send,
{
    fn data(&mut self, result: Result<HttpResponse, ConnectionError>) {
        (self.on_data)(result);
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}
