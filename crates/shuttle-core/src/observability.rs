use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::LoopId;

/// Counters shared between the run routine (writer) and observers (readers).
#[derive(Debug, Default)]
pub(crate) struct LoopCounters {
    iterations: AtomicU64,
    delivered: AtomicU64,
    recovered_faults: AtomicU64,
}

impl LoopCounters {
    /// Count one `step` call; returns the new total.
    pub(crate) fn record_iteration(&self) -> u64 {
        self.iterations.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recovery(&self) {
        self.recovered_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> LoopStats {
        LoopStats {
            iterations: self.iterations.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            recovered_faults: self.recovered_faults.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a loop's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Number of `step` calls made so far.
    pub iterations: u64,
    /// Items handed to the consumer.
    pub delivered: u64,
    /// Step faults that `handle_error` recovered from.
    pub recovered_faults: u64,
}

/// Summary returned by a clean `join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopReport {
    pub loop_id: LoopId,
    pub name: String,
    #[serde(flatten)]
    pub stats: LoopStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LoopReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
