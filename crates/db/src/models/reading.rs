//! Sensor reading rows (append-only).

use serde::Serialize;
use sqlx::FromRow;
use vitrine_core::reading::ReadingValues;
use vitrine_core::thresholds::ReadingSnapshot;
use vitrine_core::types::{DbId, Timestamp};

/// A stored sensor sample. Never updated after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reading {
    pub id: DbId,
    pub artifact_id: DbId,
    pub device_id: DbId,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
    pub air_pressure: Option<f64>,
    pub mold_risk: Option<f64>,
    pub illuminance: Option<f64>,
    pub recorded_at: Timestamp,
    pub created_at: Timestamp,
}

impl Reading {
    pub fn values(&self) -> ReadingValues {
        ReadingValues {
            temperature: self.temperature,
            humidity: self.humidity,
            co2: self.co2,
            air_pressure: self.air_pressure,
            mold_risk: self.mold_risk,
            illuminance: self.illuminance,
        }
    }

    /// View of this reading as consumed by the threshold evaluator.
    pub fn snapshot(&self) -> ReadingSnapshot {
        ReadingSnapshot {
            reading_id: self.id,
            artifact_id: self.artifact_id,
            device_id: self.device_id,
            recorded_at: self.recorded_at,
            values: self.values(),
        }
    }
}
