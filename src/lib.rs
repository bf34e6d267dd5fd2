//! InfraSense - real-time multi-sensor telemetry core.
//!
//! This library ingests heterogeneous sensor telemetry (health,
//! environment, GPS, RFID checkpoints) arriving as JSON on a message-bus
//! topic and keeps the most recent window of each sensor's readings
//! available to polling consumers with sub-second latency.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      InfraSense Agent                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌────────────┐   ┌─────────────────────┐    │
//! │  │ Decoder  │──▶│ Classifier │──▶│ Rolling Window Store │    │
//! │  │ (bytes)  │   │ (demux)    │   │ (100 per kind, FIFO) │    │
//! │  └──────────┘   └────────────┘   └─────────────────────┘    │
//! │       │               │                    │                 │
//! │       ▼               ▼                    ▼                 │
//! │  ┌──────────┐   ┌────────────┐   ┌─────────────────────┐    │
//! │  │  Ingest  │   │ Checkpoint │   │    Query Facade      │    │
//! │  │  Stats   │   │  Tracker   │   │ (latest / alerts)    │    │
//! │  └──────────┘   └────────────┘   └─────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The broker transport lives outside this crate: it delivers raw
//! payloads through a bounded channel and reports connectivity through a
//! [`transport::ConnectionMonitor`]. Malformed input never crosses the
//! decode boundary, a malformed message never stalls the stream, and
//! gas-sensor payloads are recognized but suppressed before buffering.
//!
//! # Example
//!
//! ```no_run
//! use infrasense::alerts::AlertEvaluator;
//! use infrasense::checkpoint::create_shared_tracker;
//! use infrasense::pipeline::Pipeline;
//! use infrasense::query::QueryFacade;
//! use infrasense::stats::create_shared_stats;
//! use infrasense::store::create_shared_store;
//! use infrasense::telemetry::SensorKind;
//! use infrasense::transport::ConnectionMonitor;
//!
//! let store = create_shared_store(100);
//! let stats = create_shared_stats();
//! let checkpoints = create_shared_tracker(100);
//!
//! let pipeline = Pipeline::new(store.clone(), stats.clone(), checkpoints.clone(), "rfid");
//! let facade = QueryFacade::new(
//!     store,
//!     AlertEvaluator::default(),
//!     ConnectionMonitor::new(),
//!     stats,
//!     checkpoints,
//! );
//!
//! pipeline.on_message(br#"{"sensor":"MAX30105","heart_rate":72,"spo2":98.5}"#);
//! let latest = facade.latest(SensorKind::HeartRateOxygen);
//! ```

pub mod alerts;
pub mod checkpoint;
pub mod config;
pub mod pipeline;
pub mod query;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod transport;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use alerts::{AlertEvaluator, AlertState, NormalRange, ThresholdTable};
pub use checkpoint::{CheckpointStatus, CheckpointTracker, RfidScan, SharedCheckpointTracker};
pub use config::Config;
pub use pipeline::Pipeline;
pub use query::QueryFacade;
pub use stats::{IngestStats, SharedStats, StatsSnapshot};
pub use store::{RollingStore, SharedStore};
pub use telemetry::{DecodeError, DecodedRecord, SensorKind, SensorReading};
pub use transport::{ConnectionMonitor, ConnectionStatus, RawMessage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
