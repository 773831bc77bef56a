/*
 * tls.rs
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

//! Certificate strategies against a live localhost TLS server with generated certificates.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rcgen::{CertificateParams, CertifiedKey, DistinguishedName, DnType, KeyPair};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName, UnixTime,
};
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;

use pinhttp_core::protocol::http::{ConnectionError, HttpResponse, TransportError};
use pinhttp_core::tls::trust::crypto_provider;
use pinhttp_core::tls::{certificate_digest, ServerTrust, TrustEvaluator, WebPkiTrustEvaluator};
use pinhttp_core::{
    CertificateValidation, ConnectionConfiguration, EventQueue, HttpClient, Method, ResponseMode,
};

const RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{\"ok\":true}";

struct Identity {
    cert: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
}

impl Identity {
    fn with_common_name(common_name: &str) -> Self {
        let mut params = CertificateParams::new(vec!["127.0.0.1".to_string()]).unwrap();
        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, common_name);
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Self {
            cert: cert.der().clone(),
            key: PrivatePkcs8KeyDer::from(key.serialize_der()).into(),
        }
    }

    fn simple() -> Self {
        let CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string()]).unwrap();
        Self {
            cert: cert.der().clone(),
            key: PrivatePkcs8KeyDer::from(signing_key.serialize_der()).into(),
        }
    }
}

/// How the test server ends the connection after answering.
#[derive(Clone, Copy)]
enum Close {
    /// Send close_notify, then close.
    Graceful,
    /// Drop the TCP stream without close_notify.
    Abrupt,
}

/// Serve one TLS connection: read the request head, answer, close.
async fn serve(identity: &Identity, response: &'static [u8]) -> u16 {
    serve_closing(identity, response, Close::Graceful).await
}

async fn serve_closing(identity: &Identity, response: &'static [u8], close: Close) -> u16 {
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![identity.cert.clone()], identity.key.clone_key())
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let Ok(mut tls) = acceptor.accept(socket).await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match tls.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = tls.write_all(response).await;
        match close {
            Close::Graceful => {
                let _ = tls.shutdown().await;
            }
            Close::Abrupt => {
                let _ = tls.flush().await;
                let (tcp, _) = tls.into_inner();
                drop(tcp);
            }
        }
    });
    port
}

/// Run one request and collect what the handler saw.
async fn fetch(
    url: String,
    validation: CertificateValidation,
    mode: ResponseMode,
) -> Vec<Result<HttpResponse, ConnectionError>> {
    let config = ConnectionConfiguration::builder(url, Method::Get, validation, mode)
        .timeout_secs(10.0)
        .queue(EventQueue::current("tls-test"))
        .build();
    let results = Arc::new(Mutex::new(Vec::new()));
    let (tx, mut done) = mpsc::unbounded_channel();
    let sink = results.clone();
    HttpClient::new(config)
        .connect(
            move |result| sink.lock().unwrap().push(result),
            move || {
                let _ = tx.send(());
            },
        )
        .unwrap();
    tokio::time::timeout(Duration::from_secs(10), done.recv())
        .await
        .expect("no completion")
        .unwrap();
    let collected = std::mem::take(&mut *results.lock().unwrap());
    collected
}

fn assert_ok_json(results: &[Result<HttpResponse, ConnectionError>]) {
    assert_eq!(results.len(), 1, "{:?}", results);
    let response = results[0].as_ref().unwrap();
    assert_eq!(response.status_code, Some(200));
    assert_eq!(response.payload.as_deref(), Some(&b"{\"ok\":true}"[..]));
}

fn assert_rejected(results: &[Result<HttpResponse, ConnectionError>]) {
    assert_eq!(results.len(), 1, "{:?}", results);
    match &results[0] {
        Err(ConnectionError::Connection(TransportError::Tls(_))) => {}
        other => panic!("expected TLS failure, got {:?}", other),
    }
}

#[tokio::test]
async fn pinned_digest_accepts_matching_certificate() {
    let identity = Identity::simple();
    let port = serve(&identity, RESPONSE).await;
    let validation =
        CertificateValidation::pinned(["bm90IHRoaXM=".to_string(), certificate_digest(&identity.cert)]);
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        validation,
        ResponseMode::JsonData,
    )
    .await;
    assert_ok_json(&results);
}

#[tokio::test]
async fn response_survives_close_without_close_notify() {
    let identity = Identity::simple();
    let port = serve_closing(&identity, RESPONSE, Close::Abrupt).await;
    let validation = CertificateValidation::pinned([certificate_digest(&identity.cert)]);
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        validation,
        ResponseMode::JsonData,
    )
    .await;
    assert_ok_json(&results);
}

#[tokio::test]
async fn pinned_digest_rejects_other_certificate() {
    let identity = Identity::simple();
    let other = Identity::simple();
    let port = serve(&identity, RESPONSE).await;
    let validation = CertificateValidation::pinned([certificate_digest(&other.cert)]);
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        validation,
        ResponseMode::JsonData,
    )
    .await;
    assert_rejected(&results);
}

#[tokio::test]
async fn anchor_accepts_matching_common_name() {
    let identity = Identity::with_common_name("pinhttp.test");
    let port = serve(&identity, RESPONSE).await;
    let validation =
        CertificateValidation::anchor(identity.cert.clone(), Some("pinhttp.test".to_string()));
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        validation,
        ResponseMode::JsonData,
    )
    .await;
    assert_ok_json(&results);
}

#[tokio::test]
async fn anchor_rejects_common_name_mismatch() {
    let identity = Identity::with_common_name("pinhttp.test");
    let port = serve(&identity, RESPONSE).await;
    let validation =
        CertificateValidation::anchor(identity.cert.clone(), Some("elsewhere.test".to_string()));
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        validation,
        ResponseMode::JsonData,
    )
    .await;
    assert_rejected(&results);
}

#[tokio::test]
async fn anchor_rejects_unrelated_anchor() {
    let identity = Identity::with_common_name("pinhttp.test");
    let other = Identity::with_common_name("pinhttp.test");
    let port = serve(&identity, RESPONSE).await;
    let validation = CertificateValidation::anchor(other.cert.clone(), None);
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        validation,
        ResponseMode::JsonData,
    )
    .await;
    assert_rejected(&results);
}

#[tokio::test]
async fn trusted_ca_rejects_self_signed() {
    let identity = Identity::simple();
    let port = serve(&identity, RESPONSE).await;
    let results = fetch(
        format!("https://127.0.0.1:{}/status", port),
        CertificateValidation::TrustedCa,
        ResponseMode::JsonData,
    )
    .await;
    assert_rejected(&results);
}

#[tokio::test]
async fn plain_http_skips_tls() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let n = socket.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"GET /plain HTTP/1.1\r\n"));
        socket.write_all(RESPONSE).await.unwrap();
    });
    let results = fetch(
        format!("http://127.0.0.1:{}/plain", port),
        CertificateValidation::pinned(Vec::<String>::new()),
        ResponseMode::RawData,
    )
    .await;
    assert_eq!(results.len(), 1, "{:?}", results);
    let response = results[0].as_ref().unwrap();
    assert_eq!(response.payload.as_deref(), Some(RESPONSE));
    assert_eq!(response.body().as_deref(), Some(&b"{\"ok\":true}"[..]));
}

#[test]
fn webpki_evaluator_anchored() {
    let identity = Identity::with_common_name("pinhttp.test");
    let other = Identity::with_common_name("pinhttp.test");
    let evaluator = WebPkiTrustEvaluator::new(crypto_provider());
    let now = UnixTime::now();
    assert!(evaluator.evaluate_anchored(&identity.cert, &identity.cert, now));
    assert!(!evaluator.evaluate_anchored(&identity.cert, &other.cert, now));
}

#[test]
fn webpki_evaluator_system() {
    let identity = Identity::simple();
    let chain = vec![identity.cert.clone()];
    let server_name = ServerName::try_from("127.0.0.1").unwrap();
    let trust = ServerTrust {
        chain: &chain,
        server_name: &server_name,
        now: UnixTime::now(),
    };

    let mut roots = RootCertStore::empty();
    roots.add(identity.cert.clone()).unwrap();
    let trusting = WebPkiTrustEvaluator::with_roots(crypto_provider(), Arc::new(roots));
    assert!(trusting.evaluate_system(&trust));

    let empty = WebPkiTrustEvaluator::with_roots(crypto_provider(), Arc::new(RootCertStore::empty()));
    assert!(!empty.evaluate_system(&trust));
}
