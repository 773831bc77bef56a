/*
 * client.rs
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

//! HTTP client: validate a configuration, create a transport for its URL and run one
//! connection with a callback handler.

use std::sync::Arc;

use crate::config::{connection_timeout, ConnectionConfiguration};
use crate::net::TlsTransportProvider;
use crate::protocol::http::connection::{HttpConnection, PendingRequest};
use crate::protocol::http::error::ConnectionError;
use crate::protocol::http::handler::{CallbackHandler, ConnectionHandler};
use crate::protocol::http::response::HttpResponse;
use crate::protocol::http::transport::{TlsOptions, TransportParameters, TransportProvider};
use crate::queue::EventQueue;

/// HTTP client for one configuration. Each `connect` starts an independent connection; the
/// client can be reused.
pub struct HttpClient {
    config: ConnectionConfiguration,
    provider: Arc<dyn TransportProvider>,
}

impl HttpClient {
    /// Client using TCP/TLS transports from `TlsTransportProvider`.
    pub fn new(config: ConnectionConfiguration) -> Self {
        Self::with_provider(config, Arc::new(TlsTransportProvider))
    }

    pub fn with_provider(
        config: ConnectionConfiguration,
        provider: Arc<dyn TransportProvider>,
    ) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &ConnectionConfiguration {
        &self.config
    }

    /// Start a connection. `on_data` receives the response or asynchronous errors;
    /// `on_complete` runs exactly once when the connection is torn down.
    ///
    /// Configuration errors are returned here and no transport is created.
    pub fn connect<D, C>(&self, on_data: D, on_complete: C) -> Result<HttpConnection, ConnectionError>
    where
        D: FnMut(Result<HttpResponse, ConnectionError>) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.connect_with_handler(Box::new(CallbackHandler::new(on_data, on_complete)))
    }

    pub fn connect_with_handler(
        &self,
        handler: Box<dyn ConnectionHandler>,
    ) -> Result<HttpConnection, ConnectionError> {
        let url = self.config.parsed_url()?;
        let timeout = self.config.timeout()?;
        let queue = match self.config.queue.clone() {
            Some(queue) => queue,
            None => EventQueue::shared().ok_or_else(|| {
                ConnectionError::Unknown("no event queue available".to_string())
            })?,
        };

        let params = TransportParameters {
            tls: url.uses_tls().then(|| TlsOptions {
                validator: Arc::new(self.config.validation.clone()),
            }),
            connection_timeout: connection_timeout(timeout),
        };
        let transport = self
            .provider
            .make_transport(url.host(), url.port_or_default(), params);

        let request = PendingRequest {
            method: self.config.method,
            url,
            headers: self.config.headers.clone(),
            body: self.config.body.clone(),
        };
        Ok(HttpConnection::open(
            transport,
            request,
            self.config.response_mode,
            queue,
            timeout,
            handler,
        ))
    }
}
