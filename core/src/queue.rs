/*
 * queue.rs
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

//! Execution context for transport events.
//!
//! An `EventQueue` is a serial, order-preserving job queue: jobs are run one at a time by a
//! single task on a tokio runtime, in dispatch order. The runtime handle is also used by
//! transports for their I/O tasks and by the deadline timer.
//!
//! `EventQueue::shared()` is the process-wide default, created on first use together with
//! the runtime that hosts it.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueInner {
    label: String,
    tx: mpsc::UnboundedSender<Job>,
    handle: Handle,
}

/// Serial job queue bound to a tokio runtime. Cheap to clone.
#[derive(Clone)]
pub struct EventQueue {
    inner: Arc<QueueInner>,
}

/// Hosts the shared runtime and the default queue.
struct SharedContext {
    _runtime: tokio::runtime::Runtime,
    queue: EventQueue,
}

fn shared_context() -> Option<&'static SharedContext> {
    static SHARED: once_cell::sync::OnceCell<SharedContext> = once_cell::sync::OnceCell::new();
    SHARED
        .get_or_try_init(|| {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("pinhttp")
                .enable_all()
                .build()?;
            let queue = EventQueue::new("pinhttp.default", runtime.handle());
            Ok::<_, std::io::Error>(SharedContext {
                _runtime: runtime,
                queue,
            })
        })
        .map_err(|e| log::warn!("[http] failed to start shared runtime: {}", e))
        .ok()
}

impl EventQueue {
    /// Create a queue whose worker task runs on `handle`.
    pub fn new(label: impl Into<String>, handle: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });
        Self {
            inner: Arc::new(QueueInner {
                label: label.into(),
                tx,
                handle: handle.clone(),
            }),
        }
    }

    /// Queue on the current tokio runtime. Panics outside a runtime, like `Handle::current`.
    pub fn current(label: impl Into<String>) -> Self {
        Self::new(label, &Handle::current())
    }

    /// Process-wide default queue, created lazily. None only if the runtime cannot start.
    pub fn shared() -> Option<EventQueue> {
        shared_context().map(|c| c.queue.clone())
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Runtime the queue (and anything it schedules) runs on.
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// Run `job` after every job dispatched before it. Dropped if the runtime has shut down.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        if self.inner.tx.send(Box::new(job)).is_err() {
            log::debug!("[http] queue {} closed, job dropped", self.inner.label);
        }
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("label", &self.inner.label)
            .finish()
    }
}
