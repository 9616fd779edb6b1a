//! Catalog and registry models: materials, artifacts and devices.
//!
//! These tables are owned by the catalog screens; the alerting core only
//! reads them, apart from the device `last_seen_at` bookkeeping.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vitrine_core::thresholds::MaterialThresholds;
use vitrine_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// A material and its safety bounds.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Material {
    pub id: DbId,
    pub name: String,
    pub threshold_temperature_lower: Option<f64>,
    pub threshold_temperature_upper: Option<f64>,
    pub threshold_humidity_lower: Option<f64>,
    pub threshold_humidity_upper: Option<f64>,
    pub threshold_co2_lower: Option<f64>,
    pub threshold_co2_upper: Option<f64>,
    pub threshold_air_pressure_lower: Option<f64>,
    pub threshold_air_pressure_upper: Option<f64>,
    pub threshold_mold_risk_lower: Option<f64>,
    pub threshold_mold_risk_upper: Option<f64>,
    pub threshold_illuminance_lower: Option<f64>,
    pub threshold_illuminance_upper: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Material {
    pub fn thresholds(&self) -> MaterialThresholds {
        MaterialThresholds {
            temperature_lower: self.threshold_temperature_lower,
            temperature_upper: self.threshold_temperature_upper,
            humidity_lower: self.threshold_humidity_lower,
            humidity_upper: self.threshold_humidity_upper,
            co2_lower: self.threshold_co2_lower,
            co2_upper: self.threshold_co2_upper,
            air_pressure_lower: self.threshold_air_pressure_lower,
            air_pressure_upper: self.threshold_air_pressure_upper,
            mold_risk_lower: self.threshold_mold_risk_lower,
            mold_risk_upper: self.threshold_mold_risk_upper,
            illuminance_lower: self.threshold_illuminance_lower,
            illuminance_upper: self.threshold_illuminance_upper,
        }
    }
}

/// DTO for creating a material.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterial {
    pub name: String,
    #[serde(default)]
    pub thresholds: MaterialThresholds,
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Artifact {
    pub id: DbId,
    pub name: String,
    pub material_id: Option<DbId>,
    /// Recipient for alert notifications about this artifact.
    pub notification_email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateArtifact {
    pub name: String,
    pub material_id: Option<DbId>,
    pub notification_email: Option<String>,
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// A registered sensor device.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: DbId,
    pub artifact_id: Option<DbId>,
    /// Identifier of the device in the vendor cloud. `None` for push-only devices.
    pub external_device_id: Option<String>,
    pub name: String,
    pub maintenance: bool,
    pub last_seen_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDevice {
    pub artifact_id: Option<DbId>,
    pub external_device_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub maintenance: bool,
}
