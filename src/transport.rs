//! Transport boundary types.
//!
//! The message-bus transport itself (broker connection, reconnects, TLS)
//! lives outside this crate. Whatever drives it delivers raw payloads
//! through a bounded channel as [`RawMessage`]s and reports its health
//! through a [`ConnectionMonitor`]. The core only ever consumes from the
//! receiving side and observes the status; it never initiates I/O.

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Bound on queued inbound messages before the producer blocks.
const INBOUND_QUEUE_CAPACITY: usize = 10_000;

/// One raw inbound message: opaque payload bytes plus arrival metadata.
///
/// Owned by the ingestion pipeline for the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Topic the message arrived on
    pub topic: String,
    /// Opaque payload bytes
    pub payload: Vec<u8>,
    /// Local arrival time, used as the observation-timestamp fallback
    pub arrived_at: DateTime<Utc>,
}

impl RawMessage {
    /// Wrap a payload arriving now on `topic`.
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
            arrived_at: Utc::now(),
        }
    }
}

/// Transport connectivity as reported by the external transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// Shared view of the transport's connection status.
///
/// The transport side calls [`set`](ConnectionMonitor::set); the query
/// facade reads [`current`](ConnectionMonitor::current). Cloning shares
/// the underlying state.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    status: Arc<RwLock<ConnectionStatus>>,
}

impl ConnectionMonitor {
    /// Create a monitor starting in `Disconnected`.
    pub fn new() -> Self {
        Self {
            status: Arc::new(RwLock::new(ConnectionStatus::Disconnected)),
        }
    }

    /// Record a status transition.
    pub fn set(&self, status: ConnectionStatus) {
        let mut guard = self.status.write().expect("connection status lock poisoned");
        if *guard != status {
            tracing::info!(status = %status, "transport connection status changed");
            *guard = status;
        }
    }

    /// The most recently reported status.
    pub fn current(&self) -> ConnectionStatus {
        self.status
            .read()
            .expect("connection status lock poisoned")
            .clone()
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the bounded channel connecting the transport to the pipeline.
pub fn message_channel() -> (Sender<RawMessage>, Receiver<RawMessage>) {
    bounded(INBOUND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_transitions() {
        let monitor = ConnectionMonitor::new();
        assert_eq!(monitor.current(), ConnectionStatus::Disconnected);

        monitor.set(ConnectionStatus::Connecting);
        monitor.set(ConnectionStatus::Connected);
        assert_eq!(monitor.current(), ConnectionStatus::Connected);

        monitor.set(ConnectionStatus::Error("broker went away".into()));
        match monitor.current() {
            ConnectionStatus::Error(reason) => assert_eq!(reason, "broker went away"),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_monitor_is_shared_across_clones() {
        let monitor = ConnectionMonitor::new();
        let observer = monitor.clone();

        monitor.set(ConnectionStatus::Connected);
        assert_eq!(observer.current(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_message_channel_delivery() {
        let (tx, rx) = message_channel();
        tx.send(RawMessage::new("sensors", br#"{"sensor":"GPS"}"#.to_vec()))
            .unwrap();

        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.topic, "sensors");
        assert!(!msg.payload.is_empty());
    }
}
