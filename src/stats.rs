//! Ingestion counters.
//!
//! Tracks how inbound messages were disposed of: buffered, suppressed,
//! downgraded, or dropped at the decode boundary. Counters are relaxed
//! atomics updated by the single ingestion path and read by any number
//! of consumers. Telemetry is non-replayable, so counts are scoped to
//! the current session and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current ingestion session.
#[derive(Debug)]
pub struct IngestStats {
    /// Messages handed to the pipeline
    received: AtomicU64,
    /// Payloads rejected at the decode boundary
    decode_errors: AtomicU64,
    /// Recognized payloads downgraded for a missing/invalid required field
    downgraded: AtomicU64,
    /// Gas-sensor payloads recognized and intentionally discarded
    suppressed: AtomicU64,
    /// Payloads with an unrecognized discriminator
    unrecognized: AtomicU64,
    /// Readings appended to a rolling window
    buffered: AtomicU64,
    /// RFID checkpoint scans recorded
    rfid_scans: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            downgraded: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            unrecognized: AtomicU64::new(0),
            buffered: AtomicU64::new(0),
            rfid_scans: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_downgraded(&self) {
        self.downgraded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unrecognized(&self) {
        self.unrecognized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffered(&self) {
        self.buffered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rfid_scan(&self) {
        self.rfid_scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            downgraded: self.downgraded.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            buffered: self.buffered.load(Ordering::Relaxed),
            rfid_scans: self.rfid_scans.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Ingestion Statistics:\n\
             - Messages received: {}\n\
             - Readings buffered: {}\n\
             - Decode errors: {}\n\
             - Downgraded (invalid field): {}\n\
             - Suppressed (gas sensor): {}\n\
             - Unrecognized sensor: {}\n\
             - RFID scans recorded: {}\n\
             - Session duration: {} seconds",
            s.received,
            s.buffered,
            s.decode_errors,
            s.downgraded,
            s.suppressed,
            s.unrecognized,
            s.rfid_scans,
            s.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.decode_errors.store(0, Ordering::Relaxed);
        self.downgraded.store(0, Ordering::Relaxed);
        self.suppressed.store(0, Ordering::Relaxed);
        self.unrecognized.store(0, Ordering::Relaxed);
        self.buffered.store(0, Ordering::Relaxed);
        self.rfid_scans.store(0, Ordering::Relaxed);
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of ingestion statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub decode_errors: u64,
    pub downgraded: u64,
    pub suppressed: u64,
    pub unrecognized: u64,
    pub buffered: u64,
    pub rfid_scans: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared ingestion stats.
pub type SharedStats = Arc<IngestStats>;

/// Create a new shared stats handle.
pub fn create_shared_stats() -> SharedStats {
    Arc::new(IngestStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counting() {
        let stats = IngestStats::new();

        stats.record_received();
        stats.record_received();
        stats.record_decode_error();
        stats.record_buffered();

        let snap = stats.snapshot();
        assert_eq!(snap.received, 2);
        assert_eq!(snap.decode_errors, 1);
        assert_eq!(snap.buffered, 1);
        assert_eq!(snap.suppressed, 0);
    }

    #[test]
    fn test_stats_reset() {
        let stats = IngestStats::new();
        stats.record_received();
        stats.record_suppressed();
        stats.reset();

        let snap = stats.snapshot();
        assert_eq!(snap.received, 0);
        assert_eq!(snap.suppressed, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = IngestStats::new();
        stats.record_suppressed();
        let summary = stats.summary();

        assert!(summary.contains("Messages received"));
        assert!(summary.contains("Suppressed (gas sensor): 1"));
    }
}
