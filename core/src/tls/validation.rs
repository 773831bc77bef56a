/*
 * validation.rs
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

//! Certificate trust policy: custom anchor, digest pinning, or system trust.
//!
//! The decision is made synchronously inside the TLS handshake and is a plain `bool`, so a
//! validator always produces exactly one answer.

use std::collections::HashSet;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};

use crate::tls::der::subject_common_name;

/// Certificate chain presented by the server, as seen during the handshake.
pub struct ServerTrust<'a> {
    /// Leaf first, then intermediates in the order the server sent them.
    pub chain: &'a [CertificateDer<'a>],
    pub server_name: &'a ServerName<'a>,
    pub now: UnixTime,
}

impl ServerTrust<'_> {
    pub fn leaf(&self) -> Option<&CertificateDer<'_>> {
        self.chain.first()
    }
}

/// Platform trust evaluation the policies are layered on.
pub trait TrustEvaluator: Send + Sync {
    /// Default system trust of the presented chain, host name included.
    fn evaluate_system(&self, trust: &ServerTrust<'_>) -> bool;

    /// Evaluate `leaf` alone against a fresh store holding only `anchor`. No host name check.
    fn evaluate_anchored(
        &self,
        leaf: &CertificateDer<'_>,
        anchor: &CertificateDer<'_>,
        now: UnixTime,
    ) -> bool;
}

/// Decides whether a presented chain is trusted.
pub trait CertificateValidator: Send + Sync {
    fn validate(&self, trust: &ServerTrust<'_>, evaluator: &dyn TrustEvaluator) -> bool;
}

/// Trust strategy for a connection.
#[derive(Clone, PartialEq, Eq)]
pub enum CertificateValidation {
    /// Re-root validation on `certificate`; optionally require the leaf's common name.
    Anchor {
        certificate: CertificateDer<'static>,
        common_name: Option<String>,
    },
    /// Base64 SHA-256 digests of acceptable certificates; any chain member may match.
    PinnedCerts(HashSet<String>),
    /// Delegate to system trust.
    TrustedCa,
}

impl CertificateValidation {
    pub fn anchor(certificate: CertificateDer<'static>, common_name: Option<String>) -> Self {
        Self::Anchor {
            certificate,
            common_name,
        }
    }

    pub fn pinned<I, S>(digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PinnedCerts(digests.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for CertificateValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateValidation::Anchor { common_name, .. } => f
                .debug_struct("Anchor")
                .field("common_name", common_name)
                .finish_non_exhaustive(),
            CertificateValidation::PinnedCerts(pins) => {
                f.debug_tuple("PinnedCerts").field(&pins.len()).finish()
            }
            CertificateValidation::TrustedCa => write!(f, "TrustedCa"),
        }
    }
}

/// Base64 (standard, padded) SHA-256 of a certificate's DER.
pub fn certificate_digest(cert: &[u8]) -> String {
    BASE64.encode(Sha256::digest(cert))
}

fn validate_anchor(
    trust: &ServerTrust<'_>,
    evaluator: &dyn TrustEvaluator,
    anchor: &CertificateDer<'_>,
    common_name: Option<&str>,
) -> bool {
    let leaf = match trust.leaf() {
        Some(leaf) => leaf,
        None => return false,
    };
    if let Some(expected) = common_name {
        let actual = subject_common_name(leaf);
        if actual.as_deref() != Some(expected) {
            log::warn!(
                "[tls] common name mismatch: expected {}, got {:?}",
                expected,
                actual
            );
            return false;
        }
    }
    evaluator.evaluate_anchored(leaf, anchor, trust.now)
}

fn validate_pinned(trust: &ServerTrust<'_>, pinned: &HashSet<String>) -> bool {
    if pinned.is_empty() {
        return false;
    }
    trust
        .chain
        .iter()
        .any(|cert| pinned.contains(&certificate_digest(cert)))
}

impl CertificateValidator for CertificateValidation {
    fn validate(&self, trust: &ServerTrust<'_>, evaluator: &dyn TrustEvaluator) -> bool {
        let trusted = match self {
            CertificateValidation::Anchor {
                certificate,
                common_name,
            } => validate_anchor(trust, evaluator, certificate, common_name.as_deref()),
            CertificateValidation::PinnedCerts(pinned) => validate_pinned(trust, pinned),
            CertificateValidation::TrustedCa => evaluator.evaluate_system(trust),
        };
        if !trusted {
            log::warn!("[tls] {:?} rejected chain of {}", self, trust.chain.len());
        }
        trusted
    }
}
