//! Run-wide conversion counters shared between workers and observers

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lock-free counters updated by conversion workers.
#[derive(Debug)]
pub struct ConversionStats {
    total: AtomicUsize,
    converted: AtomicUsize,
    failed: AtomicUsize,
    bytes_written: AtomicU64,
    started_at: DateTime<Utc>,
}

impl ConversionStats {
    pub fn new(total: usize) -> Self {
        Self {
            total: AtomicUsize::new(total),
            converted: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Record a successfully converted file.
    pub fn record_converted(&self, bytes: usize) {
        self.converted.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a file that failed to convert.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let converted = self.converted.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        StatsSnapshot {
            total,
            converted,
            failed,
            pending: total.saturating_sub(converted + failed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// Point-in-time copy of [`ConversionStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: usize,
    pub converted: usize,
    pub failed: usize,
    pub pending: usize,
    pub bytes_written: u64,
    pub started_at: String,
}
