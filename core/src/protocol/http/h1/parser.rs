/*
 * parser.rs
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

//! HTTP/1.1 response parser over the fully accumulated response.
//!
//! Runs once, when the stream reports completion. Status line is best effort: anything
//! unparseable yields no status code rather than an error.
//!
//! Known limitation: JSON extraction is a single-line heuristic. The payload is the first
//! CRLF-delimited line that starts with `{` and contains `}`; multi-line or pretty-printed
//! JSON bodies are not recognised.

use bytes::Bytes;

use crate::protocol::http::response::{HttpResponse, ResponseMode};

/// Marker that must appear verbatim for JSON extraction.
const JSON_CONTENT_TYPE: &str = "Content-Type: application/json";

/// Find CRLF in buf; return the offset of '\r', or None.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Length of the header block including the terminating blank line, or None if incomplete.
pub fn header_block_len(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|n| n + 4)
}

/// Status code from the first line ("HTTP/1.1 200 OK" -> 200).
pub fn status_code(buf: &[u8]) -> Option<u16> {
    let line_end = find_crlf(buf).unwrap_or(buf.len());
    let line = std::str::from_utf8(&buf[..line_end]).ok()?;
    line.split(' ').nth(1)?.parse::<u16>().ok()
}

/// JSON payload per the single-line heuristic; None without the JSON content-type marker.
pub fn json_payload(buf: &[u8]) -> Option<Bytes> {
    let text = std::str::from_utf8(buf).ok()?;
    if !text.contains(JSON_CONTENT_TYPE) {
        return None;
    }
    text.split("\r\n")
        .find(|line| line.starts_with('{') && line.contains('}'))
        .map(|line| Bytes::copy_from_slice(line.as_bytes()))
}

/// Convert the accumulated response bytes into an `HttpResponse`.
pub fn parse_response(buf: &[u8], mode: ResponseMode) -> HttpResponse {
    let status = status_code(buf);
    let payload = match mode {
        ResponseMode::RawData if buf.is_empty() => None,
        ResponseMode::RawData => Some(Bytes::copy_from_slice(buf)),
        ResponseMode::JsonData => json_payload(buf),
    };
    HttpResponse::new(status, mode, payload)
}
