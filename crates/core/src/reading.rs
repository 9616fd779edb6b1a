//! Canonical reading shape and vendor payload normalization.
//!
//! Device clouds and pushing devices name their properties differently
//! (`temp`, `co2Ppm`, `Relative-Humidity`, ...). [`normalize`] maps a raw JSON
//! object onto [`NormalizedReading`]; anything it does not recognise is
//! dropped.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::quantity::Quantity;
use crate::threshold_validation::validate_finite;
use crate::types::{DbId, Timestamp};

/// Lower-to-upper case boundary inside a camelCase identifier.
static CAMEL_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Vendor spellings that do not reduce to a canonical name by case folding.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("temp", "temperature"),
    ("temperature_c", "temperature"),
    ("temperature_celsius", "temperature"),
    ("hum", "humidity"),
    ("rh", "humidity"),
    ("relative_humidity", "humidity"),
    ("co2_ppm", "co2"),
    ("carbon_dioxide", "co2"),
    ("pressure", "air_pressure"),
    ("air_pressure_hpa", "air_pressure"),
    ("barometric_pressure", "air_pressure"),
    ("mould_risk", "mold_risk"),
    ("mold_risk_index", "mold_risk"),
    ("lux", "illuminance"),
    ("light", "illuminance"),
    ("illuminance_lux", "illuminance"),
    ("artifact", "artifact_id"),
    ("device", "device_id"),
    ("time", "recorded_at"),
    ("timestamp", "recorded_at"),
    ("measured_at", "recorded_at"),
];

/// Measured values of one sample. Each field is present-or-null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingValues {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
    pub air_pressure: Option<f64>,
    pub mold_risk: Option<f64>,
    pub illuminance: Option<f64>,
}

impl ReadingValues {
    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Humidity => self.humidity,
            Quantity::Co2 => self.co2,
            Quantity::AirPressure => self.air_pressure,
            Quantity::MoldRisk => self.mold_risk,
            Quantity::Illuminance => self.illuminance,
        }
    }

    pub fn set(&mut self, quantity: Quantity, value: Option<f64>) {
        let slot = match quantity {
            Quantity::Temperature => &mut self.temperature,
            Quantity::Humidity => &mut self.humidity,
            Quantity::Co2 => &mut self.co2,
            Quantity::AirPressure => &mut self.air_pressure,
            Quantity::MoldRisk => &mut self.mold_risk,
            Quantity::Illuminance => &mut self.illuminance,
        };
        *slot = value;
    }
}

/// A validated reading ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReading {
    pub artifact_id: DbId,
    pub device_id: DbId,
    pub recorded_at: Timestamp,
    pub values: ReadingValues,
}

/// Reduce a vendor field name to its canonical form.
///
/// `co2Ppm` -> `co2_ppm` -> `co2`, `Relative-Humidity` -> `relative_humidity`
/// -> `humidity`.
pub fn canonical_field_name(raw: &str) -> String {
    let snake = CAMEL_BOUNDARY_RE
        .replace_all(raw.trim(), "${1}_${2}")
        .to_lowercase()
        .replace(['-', ' ', '.'], "_");
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == snake)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(snake)
}

/// Validate and normalize a raw reading payload.
///
/// `artifact_id` and `device_id` are required. `recorded_at` defaults to
/// `now` when the payload carries no timestamp. Known quantities must be
/// finite numbers (numeric strings are accepted); `null` means absent.
pub fn normalize(raw: &Map<String, Value>, now: Timestamp) -> Result<NormalizedReading, CoreError> {
    let mut artifact_id = None;
    let mut device_id = None;
    let mut recorded_at = None;
    let mut values = ReadingValues::default();

    for (key, value) in raw {
        let name = canonical_field_name(key);
        match name.as_str() {
            "artifact_id" => artifact_id = parse_id(value, "artifact_id")?,
            "device_id" => device_id = parse_id(value, "device_id")?,
            "recorded_at" => recorded_at = parse_timestamp(value)?,
            other => {
                if let Some(quantity) = Quantity::from_name(other) {
                    values.set(quantity, parse_measurement(value, quantity)?);
                }
            }
        }
    }

    let artifact_id =
        artifact_id.ok_or_else(|| CoreError::Validation("artifact_id is required".into()))?;
    let device_id =
        device_id.ok_or_else(|| CoreError::Validation("device_id is required".into()))?;

    Ok(NormalizedReading {
        artifact_id,
        device_id,
        recorded_at: recorded_at.unwrap_or(now),
        values,
    })
}

fn parse_id(value: &Value, field: &str) -> Result<Option<DbId>, CoreError> {
    let id = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_i64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<DbId>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(Some(id)),
        _ => Err(CoreError::Validation(format!(
            "{field} must be a positive integer"
        ))),
    }
}

fn parse_timestamp(value: &Value) -> Result<Option<Timestamp>, CoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| CoreError::Validation(format!("recorded_at is not RFC 3339: {e}"))),
        // Vendor clouds report epoch milliseconds.
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(Some)
            .ok_or_else(|| CoreError::Validation("recorded_at is out of range".into())),
        _ => Err(CoreError::Validation(
            "recorded_at must be a string or epoch milliseconds".into(),
        )),
    }
}

fn parse_measurement(value: &Value, quantity: Quantity) -> Result<Option<f64>, CoreError> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let v = parsed.ok_or_else(|| {
        CoreError::Validation(format!("{quantity} must be a number"))
    })?;
    validate_finite(v, quantity.as_str())?;
    Ok(Some(v))
}
