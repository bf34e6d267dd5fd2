//! The ingestion pipeline: decode, classify, buffer.
//!
//! [`Pipeline::dispatch`] is invoked once per inbound transport message,
//! in arrival order. Every failure path is locally terminal: the message
//! is logged, counted, and dropped. Telemetry samples are independent and
//! non-retriable, so dropping a malformed one is always preferable to
//! stalling the stream — nothing here ever propagates an error upward.

use crate::checkpoint::SharedCheckpointTracker;
use crate::stats::SharedStats;
use crate::store::SharedStore;
use crate::telemetry::{coerce, decode, Classification};
use crate::transport::RawMessage;
use chrono::{DateTime, Utc};

/// Wires decoder, classifier, store, and checkpoint tracker together for
/// each inbound message.
#[derive(Clone)]
pub struct Pipeline {
    store: SharedStore,
    stats: SharedStats,
    checkpoints: SharedCheckpointTracker,
    rfid_topic: String,
}

impl Pipeline {
    pub fn new(
        store: SharedStore,
        stats: SharedStats,
        checkpoints: SharedCheckpointTracker,
        rfid_topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            stats,
            checkpoints,
            rfid_topic: rfid_topic.into(),
        }
    }

    /// Route one raw message by topic: checkpoint scans to the RFID
    /// tracker, everything else through the telemetry path.
    pub fn dispatch(&self, msg: RawMessage) {
        if msg.topic == self.rfid_topic {
            self.ingest_rfid(&msg.payload, msg.arrived_at);
        } else {
            self.ingest_telemetry(&msg.payload, msg.arrived_at);
        }
    }

    /// Ingest one telemetry payload arriving now.
    ///
    /// Entry point for callers without a [`RawMessage`] envelope.
    pub fn on_message(&self, payload: &[u8]) {
        self.ingest_telemetry(payload, Utc::now());
    }

    fn ingest_telemetry(&self, payload: &[u8], arrived_at: DateTime<Utc>) {
        self.stats.record_received();

        let record = match decode(payload) {
            Ok(record) => record,
            Err(e) => {
                self.stats.record_decode_error();
                tracing::warn!(error = %e, "dropping undecodable payload");
                return;
            }
        };

        match coerce(&record, arrived_at) {
            Classification::Reading(reading) => {
                tracing::debug!(kind = %reading.kind(), "buffered reading");
                self.store.append(reading);
                self.stats.record_buffered();
            }
            Classification::Suppressed => {
                self.stats.record_suppressed();
                tracing::debug!(
                    discriminator = record.discriminator(),
                    "suppressed gas-sensor payload"
                );
            }
            Classification::Downgraded { kind, field } => {
                self.stats.record_downgraded();
                tracing::warn!(
                    kind = %kind,
                    field,
                    "dropping reading with missing or non-numeric required field"
                );
            }
            Classification::Unrecognized => {
                self.stats.record_unrecognized();
                tracing::debug!(
                    discriminator = record.discriminator(),
                    "dropping payload from unrecognized sensor"
                );
            }
        }
    }

    fn ingest_rfid(&self, payload: &[u8], arrived_at: DateTime<Utc>) {
        self.stats.record_received();

        match self.checkpoints.ingest(payload, arrived_at) {
            Ok(scan) => {
                self.stats.record_rfid_scan();
                tracing::info!(
                    station = scan.station_id,
                    tag = scan.tag_id,
                    node = scan.node_id,
                    checkpoint = scan.checkpoint,
                    "checkpoint scan recorded"
                );
            }
            Err(e) => {
                self.stats.record_decode_error();
                tracing::warn!(error = %e, "dropping undecodable checkpoint scan");
            }
        }
    }
}
