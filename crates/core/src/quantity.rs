//! Canonical names for the environmental quantities a sensor can report.
//!
//! These names are used as the `quantity` column on `alerts`, as the
//! suffix of the `threshold_<quantity>_{lower,upper}` material columns, and
//! as the canonical keys of a normalized reading.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Air temperature in degrees Celsius.
pub const QUANTITY_TEMPERATURE: &str = "temperature";

/// Relative humidity in percent.
pub const QUANTITY_HUMIDITY: &str = "humidity";

/// CO2 concentration in ppm.
pub const QUANTITY_CO2: &str = "co2";

/// Air pressure in hPa.
pub const QUANTITY_AIR_PRESSURE: &str = "air_pressure";

/// Vendor-computed mold-risk index.
pub const QUANTITY_MOLD_RISK: &str = "mold_risk";

/// Illuminance in lux.
pub const QUANTITY_ILLUMINANCE: &str = "illuminance";

/// One of the six measured quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Temperature,
    Humidity,
    Co2,
    AirPressure,
    MoldRisk,
    Illuminance,
}

impl Quantity {
    /// Every quantity, in evaluation order.
    pub const ALL: [Quantity; 6] = [
        Quantity::Temperature,
        Quantity::Humidity,
        Quantity::Co2,
        Quantity::AirPressure,
        Quantity::MoldRisk,
        Quantity::Illuminance,
    ];

    /// Canonical string name (matches the database representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Quantity::Temperature => QUANTITY_TEMPERATURE,
            Quantity::Humidity => QUANTITY_HUMIDITY,
            Quantity::Co2 => QUANTITY_CO2,
            Quantity::AirPressure => QUANTITY_AIR_PRESSURE,
            Quantity::MoldRisk => QUANTITY_MOLD_RISK,
            Quantity::Illuminance => QUANTITY_ILLUMINANCE,
        }
    }

    /// Look up a quantity by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == name)
    }

    /// Parse a canonical name, failing with a validation error.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        Self::from_name(name)
            .ok_or_else(|| CoreError::Validation(format!("Unknown quantity: {name}")))
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
