/*
 * verifier.rs
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

//! rustls hook: routes the handshake's certificate decision to a `CertificateValidator`.

use std::fmt;
use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{CertificateError, ClientConfig, DigitallySignedStruct, Error, SignatureScheme};

use crate::tls::trust::{crypto_provider, WebPkiTrustEvaluator};
use crate::tls::validation::{CertificateValidator, ServerTrust, TrustEvaluator};

/// Server certificate verifier that asks the configured validator, once per handshake.
pub struct ValidatingVerifier {
    validator: Arc<dyn CertificateValidator>,
    evaluator: Arc<dyn TrustEvaluator>,
    provider: Arc<CryptoProvider>,
}

impl ValidatingVerifier {
    pub fn new(
        validator: Arc<dyn CertificateValidator>,
        evaluator: Arc<dyn TrustEvaluator>,
        provider: Arc<CryptoProvider>,
    ) -> Self {
        Self {
            validator,
            evaluator,
            provider,
        }
    }
}

impl fmt::Debug for ValidatingVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatingVerifier").finish_non_exhaustive()
    }
}

impl ServerCertVerifier for ValidatingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        let mut chain = Vec::with_capacity(1 + intermediates.len());
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());
        let trust = ServerTrust {
            chain: &chain,
            server_name,
            now,
        };
        if self.validator.validate(&trust, self.evaluator.as_ref()) {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// TLS client config whose certificate decision is made by `validator` over system trust.
pub fn client_config(validator: Arc<dyn CertificateValidator>) -> Result<Arc<ClientConfig>, Error> {
    let provider = crypto_provider();
    let evaluator = Arc::new(WebPkiTrustEvaluator::new(provider.clone()));
    client_config_with(validator, evaluator, provider)
}

/// As `client_config`, with an explicit evaluator. `provider` drives both the handshake and
/// signature verification.
pub fn client_config_with(
    validator: Arc<dyn CertificateValidator>,
    evaluator: Arc<dyn TrustEvaluator>,
    provider: Arc<CryptoProvider>,
) -> Result<Arc<ClientConfig>, Error> {
    let verifier = ValidatingVerifier::new(validator, evaluator, provider.clone());
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}
