/*
 * mod.rs
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

//! Certificate trust: validation policies, the rustls verifier hook, and trust evaluation.
//!
//! - `validation`: the three strategies (anchor, pinned digests, system CA) as pure policy.
//! - `trust`: evaluation on webpki (system roots, single-anchor re-rooting).
//! - `verifier`: `ServerCertVerifier` that calls the policy during the handshake.
//! - `der`: subject common name extraction for the anchor strategy.

pub mod der;
pub mod trust;
pub mod validation;
pub mod verifier;

pub use trust::WebPkiTrustEvaluator;
pub use validation::{
    certificate_digest, CertificateValidation, CertificateValidator, ServerTrust, TrustEvaluator,
};
pub use verifier::{client_config, client_config_with, ValidatingVerifier};
