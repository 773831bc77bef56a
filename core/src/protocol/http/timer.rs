/*
 * timer.rs
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

//! One-shot deadline: runs an action once after a timeout unless disarmed first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{sleep_until, Instant};

pub struct DeadlineTimer {
    task: AbortHandle,
    disarmed: Arc<AtomicBool>,
}

impl DeadlineTimer {
    /// Schedule `on_fire` on `handle`. The deadline is fixed now, not when the task first runs.
    pub fn arm<F>(handle: &Handle, timeout: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now().checked_add(timeout);
        let disarmed = Arc::new(AtomicBool::new(false));
        let flag = disarmed.clone();
        let task = handle.spawn(async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
            if !flag.swap(true, Ordering::SeqCst) {
                on_fire();
            }
        });
        Self {
            task: task.abort_handle(),
            disarmed,
        }
    }

    /// Cancel the deadline. Returns false if it already fired or was disarmed.
    pub fn disarm(&self) -> bool {
        let first = !self.disarmed.swap(true, Ordering::SeqCst);
        self.task.abort();
        first
    }

    pub fn is_armed(&self) -> bool {
        !self.disarmed.load(Ordering::SeqCst)
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_timeout() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        let timer = DeadlineTimer::arm(&Handle::current(), Duration::from_secs(1), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_armed());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
        assert!(!timer.disarm());
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        let timer = DeadlineTimer::arm(&Handle::current(), Duration::from_secs(1), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.disarm());
        assert!(!timer.disarm());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
