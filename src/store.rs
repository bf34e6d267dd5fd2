//! Rolling window storage for sensor readings.
//!
//! One fixed-capacity window per sensor kind, newest at the tail, oldest
//! evicted from the head. Windows are created lazily on the first reading
//! of a kind and live for the life of the process. The store is the only
//! mutable shared state in the core: one writer (the ingestion pipeline),
//! any number of polling readers.
//!
//! [`SensorReading`] has no `Unknown` or `GasLevel` variant, so the store
//! can never buffer either; the classifier enforces that upstream.

use crate::telemetry::{SensorKind, SensorReading};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

/// Default number of readings retained per sensor kind.
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity, FIFO-evicting storage for the most recent readings of
/// each sensor kind.
#[derive(Debug)]
pub struct RollingStore {
    capacity: usize,
    windows: RwLock<HashMap<SensorKind, VecDeque<SensorReading>>>,
}

impl RollingStore {
    /// Create a store with the default per-kind capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store retaining up to `capacity` readings per kind.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// The per-kind window capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a reading to its kind's window, evicting the oldest entry
    /// once the window is full. O(1) amortized.
    pub fn append(&self, reading: SensorReading) {
        let kind = reading.kind();
        let mut windows = self.windows.write().expect("sensor store lock poisoned");
        let window = windows
            .entry(kind)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));

        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(reading);
    }

    /// A defensive copy of the window for `kind`, oldest first.
    ///
    /// Returns an empty sequence for kinds that have never buffered.
    pub fn snapshot(&self, kind: SensorKind) -> Vec<SensorReading> {
        let windows = self.windows.read().expect("sensor store lock poisoned");
        windows
            .get(&kind)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The most recent reading for `kind`, if any.
    pub fn latest(&self, kind: SensorKind) -> Option<SensorReading> {
        let windows = self.windows.read().expect("sensor store lock poisoned");
        windows.get(&kind).and_then(|w| w.back()).cloned()
    }

    /// The kinds that currently hold at least one reading, in a stable
    /// order.
    pub fn kinds(&self) -> Vec<SensorKind> {
        let windows = self.windows.read().expect("sensor store lock poisoned");
        let mut kinds: Vec<SensorKind> = windows
            .iter()
            .filter(|(_, w)| !w.is_empty())
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort();
        kinds
    }

    /// Number of buffered readings for `kind`.
    pub fn len(&self, kind: SensorKind) -> usize {
        let windows = self.windows.read().expect("sensor store lock poisoned");
        windows.get(&kind).map(VecDeque::len).unwrap_or(0)
    }

    /// True when no kind holds any reading.
    pub fn is_empty(&self) -> bool {
        let windows = self.windows.read().expect("sensor store lock poisoned");
        windows.values().all(VecDeque::is_empty)
    }
}

impl Default for RollingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared handle to the store.
pub type SharedStore = Arc<RollingStore>;

/// Create a new shared store with the given capacity.
pub fn create_shared_store(capacity: usize) -> SharedStore {
    Arc::new(RollingStore::with_capacity(capacity))
}
