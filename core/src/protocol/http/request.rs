/*
 * request.rs
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

//! HTTP request framing: method, request target, Host, merged headers, optional body.
//!
//! One request per connection, always `Connection: close`; the response is read until the
//! peer closes the stream.

use std::collections::HashMap;

use crate::uri::Url;

/// Headers every request carries, in emission order. Caller values replace these but
/// cannot remove them.
pub const REQUIRED_HEADERS: [(&str, &str); 3] = [
    ("User-Agent", "generic/1.0"),
    ("Accept", "*/*"),
    ("Connection", "close"),
];

const CONTENT_LENGTH: &str = "Content-Length";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

/// Merge caller headers over the required defaults and add Content-Length for a body.
/// Key comparison is case-sensitive. Defaults keep their order; other caller headers follow
/// in map order.
pub fn merge_headers(
    headers: Option<&HashMap<String, String>>,
    body: Option<&[u8]>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = REQUIRED_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let Some(headers) = headers {
        for (name, value) in headers {
            set_header(&mut merged, name, value);
        }
    }
    if let Some(body) = body {
        set_header(&mut merged, CONTENT_LENGTH, &body.len().to_string());
    }
    merged
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k == name) {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Build the raw request bytes.
pub fn frame_request(
    method: Method,
    url: &Url,
    headers: Option<&HashMap<String, String>>,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut req = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\n",
        method.as_str(),
        url.request_target(),
        url.host_header()
    );
    for (k, v) in merge_headers(headers, body) {
        req.push_str(&k);
        req.push_str(": ");
        req.push_str(&v);
        req.push_str("\r\n");
    }
    req.push_str("\r\n");
    let mut out = req.into_bytes();
    if let Some(body) = body {
        out.extend_from_slice(body);
    }
    out
}
