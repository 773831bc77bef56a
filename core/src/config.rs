/*
 * config.rs
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

//! Connection configuration: immutable, reusable description of one request.
//!
//! Validation of the URL and timeout happens when a connection is started, so a configuration
//! can be built freely and the error surfaces synchronously from `connect()`.

use std::collections::HashMap;
use std::time::Duration;

use crate::protocol::http::{ConnectionError, Method, ResponseMode};
use crate::queue::EventQueue;
use crate::tls::CertificateValidation;
use crate::uri::Url;

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct ConnectionConfiguration {
    pub url: String,
    pub method: Method,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<Vec<u8>>,
    pub validation: CertificateValidation,
    pub response_mode: ResponseMode,
    /// Whole-request deadline in seconds. Must be non-negative and representable.
    pub timeout_secs: f64,
    /// Queue for transport events and callbacks. None selects the shared default queue.
    pub queue: Option<EventQueue>,
}

impl ConnectionConfiguration {
    pub fn builder(
        url: impl Into<String>,
        method: Method,
        validation: CertificateValidation,
        response_mode: ResponseMode,
    ) -> ConnectionConfigurationBuilder {
        ConnectionConfigurationBuilder {
            config: ConnectionConfiguration {
                url: url.into(),
                method,
                headers: None,
                body: None,
                validation,
                response_mode,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                queue: None,
            },
        }
    }

    /// Parse the configured URL. A URL without scheme or host is rejected.
    pub fn parsed_url(&self) -> Result<Url, ConnectionError> {
        validate_url(&self.url)
    }

    /// The timeout as a `Duration`, or the configuration error it represents.
    pub fn timeout(&self) -> Result<Duration, ConnectionError> {
        validate_timeout(self.timeout_secs)
    }
}

/// Consuming builder for `ConnectionConfiguration`.
#[derive(Debug)]
pub struct ConnectionConfigurationBuilder {
    config: ConnectionConfiguration,
}

impl ConnectionConfigurationBuilder {
    /// Replace the header map.
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.config.headers = Some(headers);
        self
    }

    /// Add or replace one header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.config.body = Some(body.into());
        self
    }

    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn queue(mut self, queue: EventQueue) -> Self {
        self.config.queue = Some(queue);
        self
    }

    pub fn build(self) -> ConnectionConfiguration {
        self.config
    }
}

pub fn validate_url(raw: &str) -> Result<Url, ConnectionError> {
    Url::parse(raw).ok_or_else(|| ConnectionError::BadUrl(raw.to_string()))
}

/// Negative values are rejected first; NaN, infinities and values beyond the largest
/// representable deadline are out of bounds.
pub fn validate_timeout(secs: f64) -> Result<Duration, ConnectionError> {
    if secs < 0.0 {
        return Err(ConnectionError::NegativeTimeout);
    }
    if !secs.is_finite() || secs >= i64::MAX as f64 {
        return Err(ConnectionError::TimeoutOutOfBounds);
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConnectionError::TimeoutOutOfBounds)
}

/// Bound on establishing the connection: whole seconds of the request timeout.
pub fn connection_timeout(timeout: Duration) -> Duration {
    Duration::from_secs(timeout.as_secs())
}
