//! Telemetry decoding and classification.
//!
//! This module turns raw transport payloads into typed sensor readings:
//! [`decode`] parses bytes at the trust boundary, [`classify`]/[`coerce`]
//! map the result onto the closed [`SensorKind`] set.

pub mod classify;
pub mod decode;
pub mod types;

// Re-export commonly used types
pub use classify::{classify, coerce, Classification};
pub use decode::{decode, DecodeError, DecodedRecord};
pub use types::{
    EnvironmentReading, GsrReading, HeartRateReading, LocationReading, SensorKind, SensorReading,
    UnknownKind,
};
