/*
 * trust.rs
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

//! Trust evaluation on rustls/webpki: system roots (native, then Mozilla) and single-anchor
//! re-rooting.

use std::sync::{Arc, OnceLock};

use tokio_rustls::rustls::client::{verify_server_cert_signed_by_trust_anchor, WebPkiServerVerifier};
use tokio_rustls::rustls::client::danger::ServerCertVerifier;
use tokio_rustls::rustls::crypto::CryptoProvider;
use tokio_rustls::rustls::pki_types::{CertificateDer, UnixTime};
use tokio_rustls::rustls::server::ParsedCertificate;
use tokio_rustls::rustls::RootCertStore;

use crate::tls::validation::{ServerTrust, TrustEvaluator};

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
pub fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            for cert in certs {
                let _ = root_store.add(cert);
            }
        }
        Err(e) => log::debug!("[tls] native roots unavailable: {}", e),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

fn system_roots() -> Arc<RootCertStore> {
    static ROOTS: OnceLock<Arc<RootCertStore>> = OnceLock::new();
    ROOTS.get_or_init(|| Arc::new(build_root_store())).clone()
}

/// Crypto provider used for signature checks: the process default if one is installed,
/// otherwise the one rustls was built with.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(tokio_rustls::rustls::crypto::aws_lc_rs::default_provider()))
}

/// `TrustEvaluator` backed by rustls' webpki verifier.
pub struct WebPkiTrustEvaluator {
    provider: Arc<CryptoProvider>,
    roots: Arc<RootCertStore>,
}

impl WebPkiTrustEvaluator {
    /// Evaluator over the system root store.
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self::with_roots(provider, system_roots())
    }

    /// Evaluator whose "system" roots are `roots` (tests, private deployments).
    pub fn with_roots(provider: Arc<CryptoProvider>, roots: Arc<RootCertStore>) -> Self {
        Self { provider, roots }
    }
}

impl TrustEvaluator for WebPkiTrustEvaluator {
    fn evaluate_system(&self, trust: &ServerTrust<'_>) -> bool {
        let (leaf, intermediates) = match trust.chain.split_first() {
            Some(split) => split,
            None => return false,
        };
        let verifier = match WebPkiServerVerifier::builder_with_provider(
            self.roots.clone(),
            self.provider.clone(),
        )
        .build()
        {
            Ok(v) => v,
            Err(e) => {
                log::warn!("[tls] cannot build system verifier: {}", e);
                return false;
            }
        };
        match verifier.verify_server_cert(leaf, intermediates, trust.server_name, &[], trust.now) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("[tls] system trust failed: {}", e);
                false
            }
        }
    }

    fn evaluate_anchored(
        &self,
        leaf: &CertificateDer<'_>,
        anchor: &CertificateDer<'_>,
        now: UnixTime,
    ) -> bool {
        let mut roots = RootCertStore::empty();
        if let Err(e) = roots.add(anchor.clone().into_owned()) {
            log::warn!("[tls] anchor certificate unusable: {}", e);
            return false;
        }
        let parsed = match ParsedCertificate::try_from(leaf) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("[tls] leaf unparseable: {}", e);
                return false;
            }
        };
        match verify_server_cert_signed_by_trust_anchor(
            &parsed,
            &roots,
            &[],
            now,
            self.provider.signature_verification_algorithms.all,
        ) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("[tls] anchored trust failed: {}", e);
                false
            }
        }
    }
}
