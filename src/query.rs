//! Read-only query facade for consumers.
//!
//! Dashboards and alert sinks poll this at their own cadence (typically
//! once per second). Every operation returns immediately with the most
//! recently committed state; nothing here waits for a new message.

use crate::alerts::{AlertEvaluator, AlertState};
use crate::checkpoint::{CheckpointStatus, RfidScan, SharedCheckpointTracker};
use crate::stats::{SharedStats, StatsSnapshot};
use crate::store::SharedStore;
use crate::telemetry::{SensorKind, SensorReading};
use crate::transport::{ConnectionMonitor, ConnectionStatus};

/// Snapshot-read access to everything the core knows.
#[derive(Clone)]
pub struct QueryFacade {
    store: SharedStore,
    evaluator: AlertEvaluator,
    connection: ConnectionMonitor,
    stats: SharedStats,
    checkpoints: SharedCheckpointTracker,
}

impl QueryFacade {
    pub fn new(
        store: SharedStore,
        evaluator: AlertEvaluator,
        connection: ConnectionMonitor,
        stats: SharedStats,
        checkpoints: SharedCheckpointTracker,
    ) -> Self {
        Self {
            store,
            evaluator,
            connection,
            stats,
            checkpoints,
        }
    }

    /// Sensor kinds that currently hold buffered readings.
    ///
    /// Gas sensors are suppressed before buffering, so `GasLevel` can
    /// never appear here.
    pub fn list_kinds(&self) -> Vec<SensorKind> {
        self.store.kinds()
    }

    /// The buffered window for `kind`, oldest first.
    pub fn snapshot(&self, kind: SensorKind) -> Vec<SensorReading> {
        self.store.snapshot(kind)
    }

    /// The most recent reading for `kind`.
    pub fn latest(&self, kind: SensorKind) -> Option<SensorReading> {
        self.store.latest(kind)
    }

    /// Freshness and abnormal-value state for `kind`, derived now.
    pub fn alert_state(&self, kind: SensorKind) -> AlertState {
        self.evaluator.evaluate(&self.store, kind)
    }

    /// Current transport connectivity as reported by the transport layer.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.current()
    }

    /// Counters for the current ingestion session.
    pub fn ingest_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Checkpoint pass state for a monitoring node's route.
    pub fn checkpoint_status(&self, node_id: &str) -> Vec<CheckpointStatus> {
        self.checkpoints.status(node_id)
    }

    /// The most recent RFID scan.
    pub fn latest_scan(&self) -> Option<RfidScan> {
        self.checkpoints.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::create_shared_tracker;
    use crate::pipeline::Pipeline;
    use crate::stats::create_shared_stats;
    use crate::store::create_shared_store;

    fn facade_with_pipeline() -> (QueryFacade, Pipeline) {
        let store = create_shared_store(100);
        let stats = create_shared_stats();
        let checkpoints = create_shared_tracker(100);
        let facade = QueryFacade::new(
            store.clone(),
            AlertEvaluator::default(),
            ConnectionMonitor::new(),
            stats.clone(),
            checkpoints.clone(),
        );
        let pipeline = Pipeline::new(store, stats, checkpoints, "rfid");
        (facade, pipeline)
    }

    #[test]
    fn test_facade_reflects_pipeline_writes() {
        let (facade, pipeline) = facade_with_pipeline();
        assert!(facade.list_kinds().is_empty());

        pipeline.on_message(br#"{"sensor":"DHT11","temperature":24.0,"humidity":55.0}"#);

        assert_eq!(
            facade.list_kinds(),
            vec![SensorKind::EnvironmentTempHumidity]
        );
        assert!(facade.latest(SensorKind::EnvironmentTempHumidity).is_some());
        assert_eq!(facade.snapshot(SensorKind::EnvironmentTempHumidity).len(), 1);
        assert_eq!(facade.ingest_stats().buffered, 1);
    }

    #[test]
    fn test_facade_reads_are_non_blocking_when_empty() {
        let (facade, _pipeline) = facade_with_pipeline();

        assert!(facade.latest(SensorKind::LocationFix).is_none());
        assert!(facade.snapshot(SensorKind::LocationFix).is_empty());
        assert!(facade.alert_state(SensorKind::LocationFix).is_stale);
        assert_eq!(facade.connection_status(), ConnectionStatus::Disconnected);
        assert!(facade.latest_scan().is_none());
    }
}
