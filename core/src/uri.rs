/*
 * uri.rs
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

//! Target URL parsing: scheme://[userinfo@]host[:port][/path][?query][#fragment].
//! Only what the request line and the transport need; no normalization beyond
//! percent-encoding characters that cannot appear in a request target.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Request-target safe set: encode space, controls, quotes and angle brackets.
/// `%` is left alone so already-encoded paths pass through unchanged.
const REQUEST_TARGET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const HTTPS_PORT: u16 = 443;
const HTTP_PORT: u16 = 80;

/// A validated absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    raw: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl Url {
    /// Parse an absolute URL. Returns None when the scheme or host is missing.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let colon = raw.find(':')?;
        let scheme = &raw[..colon];
        if scheme.is_empty()
            || !scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return None;
        }
        let rest = raw[colon + 1..].strip_prefix("//")?;

        // Drop the fragment, split query.
        let rest = rest.split('#').next().unwrap_or(rest);
        let (rest, query) = match rest.find('?') {
            Some(q) => (&rest[..q], Some(rest[q + 1..].to_string())),
            None => (rest, None),
        };
        let (authority, path) = match rest.find('/') {
            Some(p) => (&rest[..p], &rest[p..]),
            None => (rest, ""),
        };
        let host_port = match authority.rfind('@') {
            Some(at) => &authority[at + 1..],
            None => authority,
        };
        let (host, port) = split_host_port(host_port)?;
        if host.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            query,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host without brackets (IPv6 literals are returned bare).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host as written in a `Host` header: IPv6 literals are re-bracketed.
    pub fn host_header(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// Explicit port from the URL, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// True unless the scheme is plain `http`.
    pub fn uses_tls(&self) -> bool {
        self.scheme != "http"
    }

    /// Explicit port, else 80 for http and 443 for everything else.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(if self.uses_tls() {
            HTTPS_PORT
        } else {
            HTTP_PORT
        })
    }

    /// Raw path (may be empty).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Request target for the request line: path (or "/") plus "?query" when non-empty.
    pub fn request_target(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        let mut target = utf8_percent_encode(path, REQUEST_TARGET).to_string();
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(&utf8_percent_encode(q, REQUEST_TARGET).to_string());
        }
        target
    }
}

/// Split "host", "host:port", "[v6]" or "[v6]:port". None on a malformed port.
fn split_host_port(s: &str) -> Option<(&str, Option<u16>)> {
    if let Some(rest) = s.strip_prefix('[') {
        let close = rest.find(']')?;
        let host = &rest[..close];
        let after = &rest[close + 1..];
        return match after.strip_prefix(':') {
            Some(p) if !p.is_empty() => Some((host, Some(p.parse().ok()?))),
            Some(_) => Some((host, None)),
            None if after.is_empty() => Some((host, None)),
            None => None,
        };
    }
    match s.rfind(':') {
        Some(c) => {
            let p = &s[c + 1..];
            if p.is_empty() {
                Some((&s[..c], None))
            } else {
                Some((&s[..c], Some(p.parse().ok()?)))
            }
        }
        None => Some((s, None)),
    }
}
