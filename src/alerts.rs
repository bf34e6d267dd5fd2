//! Freshness and abnormal-value evaluation.
//!
//! Alert state is derived on demand from the latest buffered reading and
//! a static threshold table. Nothing here is stored or escalated: every
//! call recomputes from scratch, which keeps the evaluator stateless and
//! trivially testable against a synthetic clock.

use crate::store::RollingStore;
use crate::telemetry::SensorKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seconds without a fresh reading before a sensor is considered stale.
/// Sensors publish at roughly 1 Hz, so ten missed cadences is decisive.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 10;

/// Inclusive `[min, max]` range a field is expected to stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-kind, per-field normal ranges.
///
/// The defaults cover the fields the built-in sensors report; deployments
/// override individual entries through the configuration file. Fields
/// without an entry (raw LED intensities, altitude, satellite counts) are
/// never flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    ranges: BTreeMap<SensorKind, BTreeMap<String, NormalRange>>,
}

impl ThresholdTable {
    /// An empty table: no field is ever flagged abnormal.
    pub fn empty() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// The normal range for `field` of `kind`, if one is defined.
    pub fn normal_range(&self, kind: SensorKind, field: &str) -> Option<NormalRange> {
        self.ranges.get(&kind)?.get(field).copied()
    }

    /// Set or replace the range for one field.
    pub fn set(&mut self, kind: SensorKind, field: impl Into<String>, range: NormalRange) {
        self.ranges
            .entry(kind)
            .or_default()
            .insert(field.into(), range);
    }

    /// Merge `overrides` into this table, replacing colliding entries.
    pub fn apply_overrides(&mut self, overrides: &ThresholdTable) {
        for (kind, fields) in &overrides.ranges {
            for (field, range) in fields {
                self.set(*kind, field.clone(), *range);
            }
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let mut table = Self::empty();

        table.set(
            SensorKind::HeartRateOxygen,
            "heart_rate",
            NormalRange::new(40.0, 180.0),
        );
        table.set(
            SensorKind::HeartRateOxygen,
            "spo2",
            NormalRange::new(90.0, 100.0),
        );

        table.set(
            SensorKind::EnvironmentTempHumidity,
            "temperature",
            NormalRange::new(-10.0, 50.0),
        );
        table.set(
            SensorKind::EnvironmentTempHumidity,
            "humidity",
            NormalRange::new(0.0, 100.0),
        );

        table.set(
            SensorKind::LocationFix,
            "latitude",
            NormalRange::new(-90.0, 90.0),
        );
        table.set(
            SensorKind::LocationFix,
            "longitude",
            NormalRange::new(-180.0, 180.0),
        );

        table.set(
            SensorKind::GalvanicSkinResponse,
            "conductance",
            NormalRange::new(0.1, 20.0),
        );
        table.set(
            SensorKind::GalvanicSkinResponse,
            "stress",
            NormalRange::new(0.0, 100.0),
        );

        table
    }
}

/// Derived per-kind alert state. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    /// True when the window is empty or the latest reading is older than
    /// the staleness threshold.
    pub is_stale: bool,
    /// Numeric fields of the latest reading outside their normal range.
    pub abnormal_fields: Vec<String>,
}

impl AlertState {
    /// The state reported for a kind with no buffered readings.
    fn empty_window() -> Self {
        Self {
            is_stale: true,
            abnormal_fields: Vec::new(),
        }
    }

    pub fn is_normal(&self) -> bool {
        !self.is_stale && self.abnormal_fields.is_empty()
    }
}

/// Evaluates staleness and abnormal values for buffered sensors.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    thresholds: ThresholdTable,
    stale_after: Duration,
}

impl AlertEvaluator {
    pub fn new(thresholds: ThresholdTable, stale_after_secs: u64) -> Self {
        Self {
            thresholds,
            stale_after: Duration::seconds(stale_after_secs as i64),
        }
    }

    /// Evaluate `kind` against the wall clock.
    pub fn evaluate(&self, store: &RollingStore, kind: SensorKind) -> AlertState {
        self.evaluate_at(store, kind, Utc::now())
    }

    /// Evaluate `kind` at a caller-supplied instant.
    pub fn evaluate_at(
        &self,
        store: &RollingStore,
        kind: SensorKind,
        now: DateTime<Utc>,
    ) -> AlertState {
        let Some(latest) = store.latest(kind) else {
            return AlertState::empty_window();
        };

        let is_stale = now - latest.observed_at() > self.stale_after;

        let abnormal_fields = latest
            .numeric_fields()
            .into_iter()
            .filter(|(field, value)| {
                self.thresholds
                    .normal_range(kind, field)
                    .is_some_and(|range| !range.contains(*value))
            })
            .map(|(field, _)| field.to_string())
            .collect();

        AlertState {
            is_stale,
            abnormal_fields,
        }
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(ThresholdTable::default(), DEFAULT_STALE_AFTER_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{HeartRateReading, SensorReading};
    use chrono::TimeZone;

    fn heart(observed_at: DateTime<Utc>, heart_rate: f64, spo2: f64) -> SensorReading {
        SensorReading::HeartRateOxygen(HeartRateReading {
            observed_at,
            heart_rate,
            spo2,
            red: None,
            ir: None,
        })
    }

    #[test]
    fn test_empty_window_is_stale() {
        let store = RollingStore::new();
        let state = AlertEvaluator::default().evaluate(&store, SensorKind::HeartRateOxygen);
        assert!(state.is_stale);
        assert!(state.abnormal_fields.is_empty());
    }

    #[test]
    fn test_staleness_threshold_boundaries() {
        let observed = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let store = RollingStore::new();
        store.append(heart(observed, 72.0, 98.5));

        let evaluator = AlertEvaluator::new(ThresholdTable::default(), 10);

        // Exactly at the threshold is still fresh; one second past is not.
        let at_threshold = observed + Duration::seconds(10);
        assert!(!evaluator
            .evaluate_at(&store, SensorKind::HeartRateOxygen, at_threshold)
            .is_stale);

        let past_threshold = observed + Duration::seconds(11);
        assert!(evaluator
            .evaluate_at(&store, SensorKind::HeartRateOxygen, past_threshold)
            .is_stale);
    }

    #[test]
    fn test_normal_reading_has_no_abnormal_fields() {
        let now = Utc::now();
        let store = RollingStore::new();
        store.append(heart(now, 72.0, 98.5));

        let state = AlertEvaluator::default().evaluate_at(&store, SensorKind::HeartRateOxygen, now);
        assert!(state.is_normal());
    }

    #[test]
    fn test_out_of_range_fields_are_flagged() {
        let now = Utc::now();
        let store = RollingStore::new();
        store.append(heart(now, 220.0, 85.0));

        let state = AlertEvaluator::default().evaluate_at(&store, SensorKind::HeartRateOxygen, now);
        assert!(!state.is_stale);
        assert_eq!(state.abnormal_fields, vec!["heart_rate", "spo2"]);
    }

    #[test]
    fn test_fields_without_ranges_are_never_flagged() {
        let now = Utc::now();
        let store = RollingStore::new();
        store.append(SensorReading::HeartRateOxygen(HeartRateReading {
            observed_at: now,
            heart_rate: 72.0,
            spo2: 98.5,
            red: Some(1e12),
            ir: Some(-5.0),
        }));

        let state = AlertEvaluator::default().evaluate_at(&store, SensorKind::HeartRateOxygen, now);
        assert!(state.abnormal_fields.is_empty());
    }

    #[test]
    fn test_threshold_overrides() {
        let mut table = ThresholdTable::default();
        let mut overrides = ThresholdTable::empty();
        overrides.set(
            SensorKind::HeartRateOxygen,
            "heart_rate",
            NormalRange::new(50.0, 120.0),
        );
        table.apply_overrides(&overrides);

        assert_eq!(
            table.normal_range(SensorKind::HeartRateOxygen, "heart_rate"),
            Some(NormalRange::new(50.0, 120.0))
        );
        // Untouched entries survive the merge.
        assert_eq!(
            table.normal_range(SensorKind::HeartRateOxygen, "spo2"),
            Some(NormalRange::new(90.0, 100.0))
        );
    }

    #[test]
    fn test_threshold_table_json_round_trip() {
        let table = ThresholdTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let back: ThresholdTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
