/*
 * net.rs
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

//! Network transport: TCP connect with an optional rustls handshake, driven as a `Transport`.
//!
//! Every operation runs as a task on the runtime of the queue passed to `start`; state changes
//! and completions are dispatched back onto that queue.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::task::AbortHandle;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use crate::protocol::http::error::TransportError;
use crate::protocol::http::transport::{
    ReceiveCompletion, SendCompletion, StateHandler, Transport, TransportParameters,
    TransportProvider, TransportState,
};
use crate::queue::EventQueue;
use crate::tls::client_config;

/// Plain or TLS byte stream.
pub enum NetStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for NetStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            NetStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            NetStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for NetStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            NetStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            NetStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            NetStream::Plain(s) => Pin::new(s).poll_flush(cx),
            NetStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            NetStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            NetStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Provider of `TlsTransport`s. Used by `HttpClient::new`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsTransportProvider;

impl TransportProvider for TlsTransportProvider {
    fn make_transport(
        &self,
        host: &str,
        port: u16,
        params: TransportParameters,
    ) -> Arc<dyn Transport> {
        Arc::new(TlsTransport::new(host, port, params))
    }
}

/// TCP (and TLS, when `params.tls` is set) transport.
pub struct TlsTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    host: String,
    port: u16,
    params: TransportParameters,
    handler: Mutex<Option<StateHandler>>,
    queue: Mutex<Option<EventQueue>>,
    reader: tokio::sync::Mutex<Option<ReadHalf<NetStream>>>,
    writer: tokio::sync::Mutex<Option<WriteHalf<NetStream>>>,
    tasks: Mutex<Vec<AbortHandle>>,
    cancelled: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl TlsTransport {
    pub fn new(host: &str, port: u16, params: TransportParameters) -> Self {
        Self {
            inner: Arc::new(TransportInner {
                host: host.to_string(),
                port,
                params,
                handler: Mutex::new(None),
                queue: Mutex::new(None),
                reader: tokio::sync::Mutex::new(None),
                writer: tokio::sync::Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_tls(&self) -> bool {
        self.inner.params.tls.is_some()
    }
}

impl TransportInner {
    fn queue(&self) -> Option<EventQueue> {
        lock(&self.queue).clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Dispatch `state` to whichever handler is installed when the job runs.
    fn notify(self: &Arc<Self>, state: TransportState) {
        let Some(queue) = self.queue() else {
            log::debug!("[net] {}: no queue, dropping {:?}", self.host, state);
            return;
        };
        let inner = self.clone();
        queue.dispatch(move || {
            let handler = lock(&inner.handler).clone();
            if let Some(handler) = handler {
                handler(state);
            }
        });
    }

    /// Run `job` on the queue, unless the transport was cancelled meanwhile.
    fn complete(&self, job: impl FnOnce() + Send + 'static) {
        if self.is_cancelled() {
            return;
        }
        if let Some(queue) = self.queue() {
            queue.dispatch(job);
        }
    }

    /// Spawn `task` on the queue's runtime and remember it for cancellation.
    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let Some(queue) = self.queue() else {
            log::debug!("[net] {}: not started", self.host);
            return;
        };
        let handle = queue.handle().spawn(task).abort_handle();
        let mut tasks = lock(&self.tasks);
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    async fn establish(&self) -> Result<NetStream, TransportError> {
        let connect = async {
            let addrs: Vec<SocketAddr> = lookup_host((self.host.as_str(), self.port))
                .await
                .map_err(|e| TransportError::Dns(format!("{}: {}", self.host, e)))?
                .collect();
            let tcp = TcpStream::connect(&addrs[..]).await?;
            Ok::<_, TransportError>(tcp)
        };
        let bound = self.params.connection_timeout;
        let tcp = if bound == Duration::ZERO {
            connect.await?
        } else {
            tokio::time::timeout(bound, connect).await.map_err(|_| {
                TransportError::io(io::ErrorKind::TimedOut, "connect timed out")
            })??
        };
        let _ = tcp.set_nodelay(true);

        let Some(tls) = self.params.tls.as_ref() else {
            return Ok(NetStream::Plain(tcp));
        };
        let server_name = ServerName::try_from(self.host.as_str())
            .map_err(|_| TransportError::Tls(format!("invalid server name {}", self.host)))?
            .to_owned();
        let config = client_config(tls.validator.clone())
            .map_err(|e| TransportError::Tls(e.to_string()))?;
        let connector = TlsConnector::from(config);
        let stream = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| TransportError::Tls(e.to_string()))?;
        Ok(NetStream::Tls(Box::new(stream)))
    }

    async fn connect(self: Arc<Self>) {
        self.notify(TransportState::Preparing);
        log::debug!(
            "[net] connecting to {}:{} ({})",
            self.host,
            self.port,
            if self.params.tls.is_some() { "tls" } else { "plain" }
        );
        match self.establish().await {
            Ok(stream) => {
                let (reader, writer) = tokio::io::split(stream);
                *self.reader.lock().await = Some(reader);
                *self.writer.lock().await = Some(writer);
                if !self.is_cancelled() {
                    self.notify(TransportState::Ready);
                }
            }
            Err(e) if self.is_cancelled() => {
                log::debug!("[net] {}: connect ended after cancel: {}", self.host, e);
            }
            Err(e) if e.is_network_down() => {
                log::warn!("[net] {}:{}: {}", self.host, self.port, e);
                self.notify(TransportState::Waiting(e));
            }
            Err(e) => {
                log::warn!("[net] {}:{}: {}", self.host, self.port, e);
                self.notify(TransportState::Failed(e));
            }
        }
    }

    async fn write(&self, content: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| TransportError::io(io::ErrorKind::NotConnected, "not connected"))?;
        writer.write_all(content).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read at least `min_len` bytes (unless the peer closes), at most `max_len`.
    /// Returns the data and whether end of stream was reached.
    async fn read(
        &self,
        min_len: usize,
        max_len: usize,
    ) -> Result<(Option<Bytes>, bool), TransportError> {
        let mut guard = self.reader.lock().await;
        let reader = guard
            .as_mut()
            .ok_or_else(|| TransportError::io(io::ErrorKind::NotConnected, "not connected"))?;
        let max_len = max_len.max(1);
        let min_len = min_len.clamp(1, max_len);
        let mut buf = vec![0u8; max_len];
        let mut filled = 0;
        let mut eof = false;
        while filled < min_len {
            let n = match reader.read(&mut buf[filled..]).await {
                Ok(n) => n,
                // TLS peer closed TCP without close_notify; the response is read to close anyway.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    log::debug!("[net] {}: closed without close_notify", self.host);
                    0
                }
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                eof = true;
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        let data = if buf.is_empty() {
            None
        } else {
            Some(Bytes::from(buf))
        };
        Ok((data, eof))
    }

    async fn close(self: Arc<Self>) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        self.reader.lock().await.take();
        log::debug!("[net] {}:{} closed", self.host, self.port);
        self.notify(TransportState::Cancelled);
    }
}

impl Transport for TlsTransport {
    fn set_state_handler(&self, handler: Option<StateHandler>) {
        *lock(&self.inner.handler) = handler;
    }

    fn start(&self, queue: EventQueue) {
        {
            let mut slot = lock(&self.inner.queue);
            if slot.is_some() {
                log::debug!("[net] {}: already started", self.inner.host);
                return;
            }
            *slot = Some(queue.clone());
        }
        if self.inner.is_cancelled() {
            queue.handle().spawn(self.inner.clone().close());
            return;
        }
        self.inner.spawn(self.inner.clone().connect());
    }

    fn send(&self, content: Vec<u8>, completion: SendCompletion) {
        let inner = self.inner.clone();
        self.inner.spawn(async move {
            let result = inner.write(&content).await;
            if let Err(e) = result.as_ref() {
                log::warn!("[net] {}: write failed: {}", inner.host, e);
            }
            inner.complete(move || completion(result.err()));
        });
    }

    fn receive(&self, min_len: usize, max_len: usize, completion: ReceiveCompletion) {
        let inner = self.inner.clone();
        self.inner.spawn(async move {
            match inner.read(min_len, max_len).await {
                Ok((data, eof)) => inner.complete(move || completion(data, eof, None)),
                Err(e) => {
                    log::warn!("[net] {}: read failed: {}", inner.host, e);
                    inner.complete(move || completion(None, false, Some(e)));
                }
            }
        });
    }

    fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        for task in lock(&self.inner.tasks).drain(..) {
            task.abort();
        }
        let Some(queue) = self.inner.queue() else {
            log::debug!("[net] {}: cancelled before start", self.inner.host);
            return;
        };
        queue.handle().spawn(self.inner.clone().close());
    }
}
