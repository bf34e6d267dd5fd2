//! Typed sensor readings for the telemetry core.
//!
//! Every reading carries its own `observed_at` timestamp. When a payload
//! has no parseable timestamp the decoder substitutes the arrival time,
//! so `observed_at` is always populated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of sensor kinds this system recognizes.
///
/// Fixed at compile time, never extended at runtime. `GasLevel` is
/// recognized on the wire but suppressed before buffering; `Unknown`
/// covers everything the classifier cannot (or will not) place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    HeartRateOxygen,
    EnvironmentTempHumidity,
    GasLevel,
    LocationFix,
    GalvanicSkinResponse,
    Unknown,
}

impl SensorKind {
    /// Stable string form, used in query paths and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::HeartRateOxygen => "heart_rate_oxygen",
            SensorKind::EnvironmentTempHumidity => "environment_temp_humidity",
            SensorKind::GasLevel => "gas_level",
            SensorKind::LocationFix => "location_fix",
            SensorKind::GalvanicSkinResponse => "galvanic_skin_response",
            SensorKind::Unknown => "unknown",
        }
    }

    /// The kinds that may ever hold buffered data.
    ///
    /// Excludes `GasLevel` (suppressed) and `Unknown` (dropped).
    pub fn bufferable() -> &'static [SensorKind] {
        &[
            SensorKind::HeartRateOxygen,
            SensorKind::EnvironmentTempHumidity,
            SensorKind::LocationFix,
            SensorKind::GalvanicSkinResponse,
        ]
    }

    /// Unit annotations for the numeric fields of this kind.
    pub fn field_units(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            SensorKind::HeartRateOxygen => &[
                ("heart_rate", "bpm"),
                ("spo2", "%"),
                ("red", "counts"),
                ("ir", "counts"),
            ],
            SensorKind::EnvironmentTempHumidity => {
                &[("temperature", "°C"), ("humidity", "%")]
            }
            SensorKind::GasLevel => &[("gas_level", "ppm")],
            SensorKind::LocationFix => &[
                ("latitude", "deg"),
                ("longitude", "deg"),
                ("altitude", "m"),
                ("satellites", "count"),
            ],
            SensorKind::GalvanicSkinResponse => {
                &[("conductance", "µS"), ("stress", "index")]
            }
            SensorKind::Unknown => &[],
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a kind string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sensor kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for SensorKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heart_rate_oxygen" | "heart" => Ok(SensorKind::HeartRateOxygen),
            "environment_temp_humidity" | "environment" => {
                Ok(SensorKind::EnvironmentTempHumidity)
            }
            "gas_level" | "gas" => Ok(SensorKind::GasLevel),
            "location_fix" | "gps" => Ok(SensorKind::LocationFix),
            "galvanic_skin_response" | "gsr" => Ok(SensorKind::GalvanicSkinResponse),
            "unknown" => Ok(SensorKind::Unknown),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Pulse-oximeter reading (MAX3010x family).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateReading {
    /// When the sensor observed this sample
    pub observed_at: DateTime<Utc>,
    /// Heart rate in beats per minute
    pub heart_rate: f64,
    /// Blood oxygen saturation in percent
    pub spo2: f64,
    /// Raw red LED intensity, if the sensor reports it
    pub red: Option<f64>,
    /// Raw infrared LED intensity, if the sensor reports it
    pub ir: Option<f64>,
}

/// Temperature and humidity reading (DHT family).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    pub observed_at: DateTime<Utc>,
    /// Ambient temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

/// GPS position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub observed_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters, if the receiver reports it
    pub altitude: Option<f64>,
    /// Number of satellites in the fix, if reported
    pub satellites: Option<u32>,
}

/// Galvanic skin response reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GsrReading {
    pub observed_at: DateTime<Utc>,
    /// Skin conductance in microsiemens
    pub conductance: f64,
    /// Derived stress index, if the sensor node computes one
    pub stress: Option<f64>,
}

/// A classified, coerced sensor reading. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorReading {
    HeartRateOxygen(HeartRateReading),
    EnvironmentTempHumidity(EnvironmentReading),
    LocationFix(LocationReading),
    GalvanicSkinResponse(GsrReading),
}

impl SensorReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::HeartRateOxygen(_) => SensorKind::HeartRateOxygen,
            SensorReading::EnvironmentTempHumidity(_) => SensorKind::EnvironmentTempHumidity,
            SensorReading::LocationFix(_) => SensorKind::LocationFix,
            SensorReading::GalvanicSkinResponse(_) => SensorKind::GalvanicSkinResponse,
        }
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        match self {
            SensorReading::HeartRateOxygen(r) => r.observed_at,
            SensorReading::EnvironmentTempHumidity(r) => r.observed_at,
            SensorReading::LocationFix(r) => r.observed_at,
            SensorReading::GalvanicSkinResponse(r) => r.observed_at,
        }
    }

    /// The numeric fields of this reading, named as they appear on the
    /// wire. Optional fields are included only when present. The alert
    /// evaluator compares these against the threshold table.
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        let mut fields = Vec::with_capacity(4);
        match self {
            SensorReading::HeartRateOxygen(r) => {
                fields.push(("heart_rate", r.heart_rate));
                fields.push(("spo2", r.spo2));
                if let Some(red) = r.red {
                    fields.push(("red", red));
                }
                if let Some(ir) = r.ir {
                    fields.push(("ir", ir));
                }
            }
            SensorReading::EnvironmentTempHumidity(r) => {
                fields.push(("temperature", r.temperature));
                fields.push(("humidity", r.humidity));
            }
            SensorReading::LocationFix(r) => {
                fields.push(("latitude", r.latitude));
                fields.push(("longitude", r.longitude));
                if let Some(alt) = r.altitude {
                    fields.push(("altitude", alt));
                }
                if let Some(sat) = r.satellites {
                    fields.push(("satellites", sat as f64));
                }
            }
            SensorReading::GalvanicSkinResponse(r) => {
                fields.push(("conductance", r.conductance));
                if let Some(stress) = r.stress {
                    fields.push(("stress", stress));
                }
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            SensorKind::HeartRateOxygen,
            SensorKind::EnvironmentTempHumidity,
            SensorKind::GasLevel,
            SensorKind::LocationFix,
            SensorKind::GalvanicSkinResponse,
            SensorKind::Unknown,
        ] {
            assert_eq!(kind.as_str().parse::<SensorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!("gps".parse::<SensorKind>().unwrap(), SensorKind::LocationFix);
        assert_eq!(
            "GSR".parse::<SensorKind>().unwrap(),
            SensorKind::GalvanicSkinResponse
        );
        assert!("thermocouple".parse::<SensorKind>().is_err());
    }

    #[test]
    fn test_bufferable_excludes_gas_and_unknown() {
        let kinds = SensorKind::bufferable();
        assert!(!kinds.contains(&SensorKind::GasLevel));
        assert!(!kinds.contains(&SensorKind::Unknown));
        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn test_numeric_fields_skip_absent_optionals() {
        let reading = SensorReading::HeartRateOxygen(HeartRateReading {
            observed_at: Utc::now(),
            heart_rate: 72.0,
            spo2: 98.5,
            red: None,
            ir: Some(95_000.0),
        });
        let fields = reading.numeric_fields();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().any(|(name, v)| *name == "ir" && *v == 95_000.0));
        assert!(!fields.iter().any(|(name, _)| *name == "red"));
    }
}
