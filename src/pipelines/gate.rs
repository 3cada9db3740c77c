//! Concurrency gate protecting model inference from overload.
//!
//! A bounded set of inflight slots plus a bounded FIFO waiting queue.
//! Durations of completed translations feed an EMA used to estimate
//! `Retry-After` for rejected requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{Semaphore, TryAcquireError};

use crate::common::config::Config;
use crate::common::error::NmtError;

/// Counters snapshot for observability endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct QueueMetrics {
    pub inflight: usize,
    pub waiting: usize,
    pub capacity_inflight: usize,
    pub capacity_wait: usize,
    pub ema_duration_sec: f64,
}

#[derive(Debug)]
pub struct TranslateGate {
    semaphore: Arc<Semaphore>,
    queue_enabled: bool,
    max_inflight: usize,
    max_queue: usize,
    waiting: AtomicUsize,
    inflight: AtomicUsize,
    ema_duration_sec: Mutex<f64>,
    alpha: f64,
    retry_after_min_sec: f64,
    retry_after_max_sec: f64,
}

impl TranslateGate {
    pub fn new(config: &Config, max_inflight: usize) -> TranslateGate {
        let max_inflight = max_inflight.max(1);
        TranslateGate {
            semaphore: Arc::new(Semaphore::new(max_inflight)),
            queue_enabled: config.enable_queue,
            max_inflight,
            max_queue: config.max_queue_size,
            waiting: AtomicUsize::new(0),
            inflight: AtomicUsize::new(0),
            ema_duration_sec: Mutex::new(0.0),
            alpha: config.retry_after_alpha,
            retry_after_min_sec: config.retry_after_min_sec,
            retry_after_max_sec: config.retry_after_max_sec,
        }
    }

    /// Acquire an inflight slot, waiting in FIFO order when the queue is
    /// enabled. Fails fast with `ServiceBusy` when queueing is disabled,
    /// `QueueOverflow` when the waiting line is full, and
    /// `TranslationTimeout` when `timeout` elapses first; an expired
    /// waiter leaves no counter residue and no slot leak.
    pub async fn acquire(
        self: &Arc<Self>,
        timeout: Option<Duration>,
    ) -> Result<TranslateSlot, NmtError> {
        if !self.queue_enabled {
            return match Arc::clone(&self.semaphore).try_acquire_owned() {
                Ok(permit) => Ok(self.slot(permit)),
                Err(TryAcquireError::NoPermits) => Err(NmtError::ServiceBusy),
                Err(TryAcquireError::Closed) => Err(NmtError::ServiceBusy),
            };
        }

        let waiters = self.waiting.fetch_add(1, Ordering::SeqCst) + 1;
        if self.semaphore.available_permits() == 0 && waiters > self.max_queue {
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            return Err(NmtError::QueueOverflow { waiters });
        }

        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        let permit = match timeout {
            Some(limit) => match tokio::time::timeout(limit, acquire).await {
                Ok(result) => result,
                Err(_) => {
                    self.waiting.fetch_sub(1, Ordering::SeqCst);
                    return Err(NmtError::TranslationTimeout);
                }
            },
            None => acquire.await,
        };
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        match permit {
            Ok(permit) => Ok(self.slot(permit)),
            Err(_) => Err(NmtError::ServiceBusy),
        }
    }

    fn slot(self: &Arc<Self>, permit: tokio::sync::OwnedSemaphorePermit) -> TranslateSlot {
        self.inflight.fetch_add(1, Ordering::SeqCst);
        TranslateSlot {
            gate: Arc::clone(self),
            _permit: permit,
            started: Instant::now(),
        }
    }

    /// Blend a completed translation's duration into the EMA.
    fn record_duration(&self, duration: Duration) {
        let seconds = duration.as_secs_f64();
        let mut ema = self.ema_duration_sec.lock();
        if *ema <= 0.0 {
            *ema = seconds;
        } else {
            *ema = (1.0 - self.alpha) * *ema + self.alpha * seconds;
        }
    }

    /// Seconds a rejected caller should wait before retrying: roughly the
    /// number of batches ahead of it times the smoothed duration, clamped
    /// to the configured bounds.
    pub fn estimate_retry_after(&self, waiters: Option<usize>) -> u64 {
        let ema = *self.ema_duration_sec.lock();
        let base = if ema > 0.0 { ema } else { self.retry_after_min_sec };
        let base = base.max(self.retry_after_min_sec);
        let capacity = self.max_inflight.max(1) as f64;

        let estimate = match waiters {
            // Only known to be busy: assume at least one batch ahead
            None => base,
            Some(count) => (count as f64 / capacity) * base,
        };

        let clamped = estimate
            .max(self.retry_after_min_sec)
            .min(self.retry_after_max_sec);
        (clamped.ceil() as u64).max(1)
    }

    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            inflight: self.inflight.load(Ordering::SeqCst),
            waiting: self.waiting.load(Ordering::SeqCst),
            capacity_inflight: self.max_inflight,
            capacity_wait: self.max_queue,
            ema_duration_sec: *self.ema_duration_sec.lock(),
        }
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight
    }

    pub fn queue_enabled(&self) -> bool {
        self.queue_enabled
    }
}

/// RAII inflight slot. Dropping it records the translation duration and
/// wakes the next FIFO waiter.
#[derive(Debug)]
pub struct TranslateSlot {
    gate: Arc<TranslateGate>,
    _permit: tokio::sync::OwnedSemaphorePermit,
    started: Instant,
}

impl Drop for TranslateSlot {
    fn drop(&mut self) {
        self.gate.inflight.fetch_sub(1, Ordering::SeqCst);
        self.gate.record_duration(self.started.elapsed());
    }
}
