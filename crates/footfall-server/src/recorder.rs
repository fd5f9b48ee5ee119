use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use footfall_core::track::truncate_path;
use footfall_core::visits::{PendingVisit, VisitBackend};

/// Running totals of what happened to recorded visits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecorderCounters {
    /// Rows persisted.
    pub recorded: u64,
    /// Rows lost to an insert or schema failure.
    pub failed: u64,
    /// Rows rejected because the buffer was full.
    pub dropped: u64,
}

/// Fire-and-forget visit log.
///
/// Request handlers call [`VisitRecorder::record`], which only appends to an
/// in-memory buffer. A background loop (see
/// [`crate::state::AppState::run_visit_flush_loop`]) drains the buffer and
/// writes each batch in one transaction. Failed batches are counted and
/// logged, never retried.
pub struct VisitRecorder {
    buffer: Mutex<Vec<PendingVisit>>,
    wake: Notify,
    flush_threshold: usize,
    capacity: usize,
    recorded: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl VisitRecorder {
    pub fn new(flush_threshold: usize, capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            wake: Notify::new(),
            flush_threshold: flush_threshold.max(1),
            capacity: capacity.max(1),
            recorded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue one page view stamped with the current UTC time.
    ///
    /// Never waits on storage. Returns `false` when the visit was dropped
    /// because the buffer is at capacity.
    pub async fn record(&self, visitor_id: String, path: &str) -> bool {
        let visit = PendingVisit {
            visitor_id,
            path: truncate_path(path),
            ts: Utc::now(),
        };

        let len = {
            let mut buf = self.buffer.lock().await;
            if buf.len() >= self.capacity {
                drop(buf);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(capacity = self.capacity, "Visit buffer full; dropping visit");
                return false;
            }
            buf.push(visit);
            buf.len()
        };

        if len >= self.flush_threshold {
            self.wake.notify_one();
        }
        true
    }

    /// Resolves once the buffer has crossed the flush threshold.
    pub async fn wait_for_threshold(&self) {
        self.wake.notified().await;
    }

    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Drain the buffer and write its contents to `backend`.
    ///
    /// The lock is held only for the `std::mem::take`, so `record` is never
    /// blocked behind the database write.
    pub async fn flush(&self, backend: &dyn VisitBackend) {
        let batch: Vec<PendingVisit> = {
            let mut buf = self.buffer.lock().await;
            std::mem::take(&mut *buf)
        };

        if batch.is_empty() {
            return;
        }

        let count = batch.len() as u64;
        match backend.insert_visits(&batch).await {
            Ok(()) => {
                self.recorded.fetch_add(count, Ordering::Relaxed);
                debug!(count, "Visit buffer flushed");
            }
            Err(e) => {
                self.failed.fetch_add(count, Ordering::Relaxed);
                warn!(count, error = %e, "Visit flush failed; visits lost");
            }
        }
    }

    pub fn counters(&self) -> RecorderCounters {
        RecorderCounters {
            recorded: self.recorded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
