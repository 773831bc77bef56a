/*
 * response.rs
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

//! HTTP response delivered to the data callback.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::protocol::http::h1::parser::header_block_len;

/// How the payload is extracted from the raw response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Payload is the single-line JSON object of an `application/json` response, or None.
    JsonData,
    /// Payload is the raw response bytes (status line and headers included).
    RawData,
}

/// Parsed response: optional status code, the mode it was parsed with, optional payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: Option<u16>,
    pub mode: ResponseMode,
    pub payload: Option<Bytes>,
}

impl HttpResponse {
    pub fn new(status_code: Option<u16>, mode: ResponseMode, payload: Option<Bytes>) -> Self {
        Self {
            status_code,
            mode,
            payload,
        }
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }

    /// Body part of a raw payload (bytes after the blank line ending the header block).
    /// JSON payloads are returned as-is; a raw payload without a complete header block yields None.
    pub fn body(&self) -> Option<Bytes> {
        let payload = self.payload.as_ref()?;
        match self.mode {
            ResponseMode::JsonData => Some(payload.clone()),
            ResponseMode::RawData => {
                let n = header_block_len(payload)?;
                Some(payload.slice(n..))
            }
        }
    }

    /// Deserialize the payload (JSON mode) or body (raw mode) as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        let body = self.body()?;
        Some(serde_json::from_slice(&body))
    }
}
