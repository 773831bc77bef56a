/*
 * lib.rs
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

//! Pinhttp core: a small HTTP/1.1 client over TCP or TLS with pluggable certificate trust
//! (custom anchor, digest pinning, or system roots).

pub mod config;
pub mod net;
pub mod protocol;
pub mod queue;
pub mod tls;
pub mod uri;

pub use config::{ConnectionConfiguration, ConnectionConfigurationBuilder, DEFAULT_TIMEOUT_SECS};
pub use net::{TlsTransport, TlsTransportProvider};
pub use protocol::http::{
    CallbackHandler, ConnectionError, ConnectionHandler, HttpClient, HttpConnection,
    HttpResponse, Method, ResponseMode, TransportError,
};
pub use queue::EventQueue;
pub use tls::CertificateValidation;
pub use uri::Url;
