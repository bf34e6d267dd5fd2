//! RFID checkpoint tracking.
//!
//! Worker tags are scanned at fixed checkpoint stations throughout the
//! site. Stations are grouped into zones (A, B, C), each zone mapped to a
//! set of monitoring nodes with a known checkpoint route. The tracker
//! keeps the most recent scans and per-node progress so consumers can
//! render which checkpoints a node's route has passed and when.
//!
//! Checkpoint scans live outside the sensor-kind universe: they arrive on
//! their own topic and carry identity, not measurements.

use crate::telemetry::DecodeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};

/// Monitoring nodes per zone. A station like `B2` maps into the `B` set.
fn zone_nodes(zone: char) -> Option<&'static [&'static str]> {
    match zone {
        'A' => Some(&["1298", "1753", "1456"]),
        'B' => Some(&["2001", "2055", "2089"]),
        'C' => Some(&["3012", "3067", "3134"]),
        _ => None,
    }
}

/// Human-readable checkpoint name for a station id.
fn checkpoint_name(station_id: &str) -> String {
    let name = match station_id {
        "A1" => "Entry Gate",
        "A2" => "Safety Check",
        "A3" => "Equipment Bay",
        "A4" => "Deep Section",
        "B1" => "North Entry",
        "B2" => "Equipment Room",
        "B3" => "Gas Detection",
        "B4" => "Exit Portal",
        "C1" => "South Gate",
        "C2" => "Tool Center",
        "C3" => "Deep Shaft",
        "C4" => "Return Path",
        _ => return format!("Station {station_id}"),
    };
    name.to_string()
}

/// The checkpoint route each monitoring node is expected to pass.
fn node_route(node_id: &str) -> &'static [&'static str] {
    match node_id {
        "1298" => &["Entry Gate", "Safety Check", "Equipment Bay", "Deep Section"],
        "1753" => &["Main Tunnel", "Gas Monitor", "Emergency Exit"],
        "1456" => &["Shaft Entry", "Mining Face", "Ventilation Hub"],
        "2001" => &["North Entry", "Equipment Room", "Gas Detection", "Exit Portal"],
        "2055" => &["Central Hub", "Safety Station", "Mining Zone"],
        "2089" => &["Secondary Tunnel", "Emergency Bay", "Final Check"],
        "3012" => &["South Gate", "Tool Center", "Deep Shaft", "Return Path"],
        "3067" => &["Control Point", "Ventilation Room", "Safety Exit"],
        "3134" => &["Access Tunnel", "Equipment Bay", "Emergency Station"],
        _ => &[],
    }
}

/// Map a station id to the monitoring node covering it.
///
/// Stations rotate over the zone's nodes by station number; unknown zones
/// fall back to the station id itself.
fn station_node(station_id: &str) -> String {
    let Some(zone) = station_id.chars().next() else {
        return station_id.to_string();
    };
    let Some(nodes) = zone_nodes(zone.to_ascii_uppercase()) else {
        return station_id.to_string();
    };
    let station_num: usize = station_id[zone.len_utf8()..].parse().unwrap_or(1);
    let idx = station_num.saturating_sub(1) % nodes.len();
    nodes[idx].to_string()
}

/// Wire format of one checkpoint scan.
#[derive(Debug, Deserialize)]
struct RfidPayload {
    station_id: String,
    tag_id: String,
}

/// A recorded checkpoint scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfidScan {
    pub tag_id: String,
    pub station_id: String,
    pub node_id: String,
    pub checkpoint: String,
    pub scanned_at: DateTime<Utc>,
}

/// Pass state of one checkpoint on a node's route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointStatus {
    pub checkpoint: String,
    pub passed: bool,
    pub passed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct TrackerState {
    scans: VecDeque<RfidScan>,
    /// node_id -> checkpoint name -> pass time
    progress: HashMap<String, BTreeMap<String, DateTime<Utc>>>,
}

/// Tracks checkpoint scans and per-node route progress.
#[derive(Debug)]
pub struct CheckpointTracker {
    capacity: usize,
    state: RwLock<TrackerState>,
}

impl CheckpointTracker {
    /// Create a tracker retaining up to `capacity` recent scans.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: RwLock::new(TrackerState::default()),
        }
    }

    /// Parse and record a scan payload like
    /// `{"station_id":"A1","tag_id":"TAG123"}`.
    pub fn ingest(&self, payload: &[u8], at: DateTime<Utc>) -> Result<RfidScan, DecodeError> {
        let parsed: RfidPayload = serde_json::from_slice(payload)
            .map_err(|e| DecodeError::MalformedEncoding(e.to_string()))?;
        Ok(self.record(&parsed.station_id, &parsed.tag_id, at))
    }

    /// Record one scan and update the owning node's progress.
    pub fn record(&self, station_id: &str, tag_id: &str, at: DateTime<Utc>) -> RfidScan {
        let scan = RfidScan {
            tag_id: tag_id.to_string(),
            station_id: station_id.to_string(),
            node_id: station_node(station_id),
            checkpoint: checkpoint_name(station_id),
            scanned_at: at,
        };

        let mut state = self.state.write().expect("checkpoint tracker lock poisoned");
        if state.scans.len() == self.capacity {
            state.scans.pop_front();
        }
        state.scans.push_back(scan.clone());
        state
            .progress
            .entry(scan.node_id.clone())
            .or_default()
            .insert(scan.checkpoint.clone(), at);

        scan
    }

    /// The most recent scan, if any.
    pub fn latest(&self) -> Option<RfidScan> {
        let state = self.state.read().expect("checkpoint tracker lock poisoned");
        state.scans.back().cloned()
    }

    /// A defensive copy of the retained scan history, oldest first.
    pub fn scans(&self) -> Vec<RfidScan> {
        let state = self.state.read().expect("checkpoint tracker lock poisoned");
        state.scans.iter().cloned().collect()
    }

    /// Pass state for every checkpoint on `node_id`'s route.
    pub fn status(&self, node_id: &str) -> Vec<CheckpointStatus> {
        let state = self.state.read().expect("checkpoint tracker lock poisoned");
        let progress = state.progress.get(node_id);

        node_route(node_id)
            .iter()
            .map(|checkpoint| {
                let passed_at = progress.and_then(|p| p.get(*checkpoint)).copied();
                CheckpointStatus {
                    checkpoint: checkpoint.to_string(),
                    passed: passed_at.is_some(),
                    passed_at,
                }
            })
            .collect()
    }

    /// All monitoring node ids with a defined route.
    pub fn known_nodes() -> &'static [&'static str] {
        &[
            "1298", "1753", "1456", "2001", "2055", "2089", "3012", "3067", "3134",
        ]
    }
}

/// Thread-safe shared checkpoint tracker.
pub type SharedCheckpointTracker = Arc<CheckpointTracker>;

/// Create a new shared tracker with the given scan-history capacity.
pub fn create_shared_tracker(capacity: usize) -> SharedCheckpointTracker {
    Arc::new(CheckpointTracker::new(capacity))
}
