//! Threshold evaluation engine for artifact climate readings.
//!
//! Pure logic: no database access. The caller fetches the reading and the
//! artifact's material thresholds and passes them in.

use serde::{Deserialize, Serialize};

use crate::alert::{BreachCandidate, BreachDirection};
use crate::error::CoreError;
use crate::quantity::Quantity;
use crate::reading::ReadingValues;
use crate::threshold_validation::validate_bounds;
use crate::types::{DbId, Timestamp};

/// Safety bounds of one material. `None` means no limit in that direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialThresholds {
    pub temperature_lower: Option<f64>,
    pub temperature_upper: Option<f64>,
    pub humidity_lower: Option<f64>,
    pub humidity_upper: Option<f64>,
    pub co2_lower: Option<f64>,
    pub co2_upper: Option<f64>,
    pub air_pressure_lower: Option<f64>,
    pub air_pressure_upper: Option<f64>,
    pub mold_risk_lower: Option<f64>,
    pub mold_risk_upper: Option<f64>,
    pub illuminance_lower: Option<f64>,
    pub illuminance_upper: Option<f64>,
}

impl MaterialThresholds {
    /// Check that every configured bound pair is well formed.
    pub fn validate(&self) -> Result<(), CoreError> {
        for binding in &BINDINGS {
            validate_bounds(
                (binding.lower)(self),
                (binding.upper)(self),
                binding.quantity.as_str(),
            )?;
        }
        Ok(())
    }
}

/// A stored reading as seen by the evaluator.
#[derive(Debug, Clone)]
pub struct ReadingSnapshot {
    pub reading_id: DbId,
    pub artifact_id: DbId,
    pub device_id: DbId,
    pub recorded_at: Timestamp,
    pub values: ReadingValues,
}

/// Accessors tying one quantity to its reading field and material bounds.
struct QuantityBinding {
    quantity: Quantity,
    value: fn(&ReadingValues) -> Option<f64>,
    lower: fn(&MaterialThresholds) -> Option<f64>,
    upper: fn(&MaterialThresholds) -> Option<f64>,
}

static BINDINGS: [QuantityBinding; 6] = [
    QuantityBinding {
        quantity: Quantity::Temperature,
        value: |r| r.temperature,
        lower: |t| t.temperature_lower,
        upper: |t| t.temperature_upper,
    },
    QuantityBinding {
        quantity: Quantity::Humidity,
        value: |r| r.humidity,
        lower: |t| t.humidity_lower,
        upper: |t| t.humidity_upper,
    },
    QuantityBinding {
        quantity: Quantity::Co2,
        value: |r| r.co2,
        lower: |t| t.co2_lower,
        upper: |t| t.co2_upper,
    },
    QuantityBinding {
        quantity: Quantity::AirPressure,
        value: |r| r.air_pressure,
        lower: |t| t.air_pressure_lower,
        upper: |t| t.air_pressure_upper,
    },
    QuantityBinding {
        quantity: Quantity::MoldRisk,
        value: |r| r.mold_risk,
        lower: |t| t.mold_risk_lower,
        upper: |t| t.mold_risk_upper,
    },
    QuantityBinding {
        quantity: Quantity::Illuminance,
        value: |r| r.illuminance,
        lower: |t| t.illuminance_lower,
        upper: |t| t.illuminance_upper,
    },
];

/// Evaluate one reading against its material thresholds.
///
/// Comparisons are strict: a value equal to a bound is not a breach. Each
/// quantity yields at most one candidate.
pub fn evaluate(reading: &ReadingSnapshot, thresholds: &MaterialThresholds) -> Vec<BreachCandidate> {
    BINDINGS
        .iter()
        .filter_map(|binding| check_quantity(reading, thresholds, binding))
        .collect()
}

/// Compare a single quantity against its bounds.
fn check_quantity(
    reading: &ReadingSnapshot,
    thresholds: &MaterialThresholds,
    binding: &QuantityBinding,
) -> Option<BreachCandidate> {
    let value = (binding.value)(&reading.values)?;
    let lower = (binding.lower)(thresholds);
    let upper = (binding.upper)(thresholds);

    let (direction, threshold_value) = match (lower, upper) {
        (Some(lo), _) if value < lo => (BreachDirection::Lower, lo),
        (_, Some(hi)) if value > hi => (BreachDirection::Upper, hi),
        _ => return None, // within range, or no bounds configured
    };

    Some(BreachCandidate {
        artifact_id: reading.artifact_id,
        device_id: reading.device_id,
        reading_id: reading.reading_id,
        quantity: binding.quantity,
        direction,
        measured_value: value,
        threshold_value,
        detected_at: reading.recorded_at,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
