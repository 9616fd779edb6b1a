//! Query parameter types for list endpoints.

use serde::Deserialize;
use vitrine_core::alert::AlertStatus;
use vitrine_core::error::CoreError;
use vitrine_core::quantity::Quantity;
use vitrine_core::types::DbId;
use vitrine_db::models::alert::AlertFilter;

/// `GET /alerts?artifact_id=&device_id=&status=&quantity=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct AlertListParams {
    pub artifact_id: Option<DbId>,
    pub device_id: Option<DbId>,
    pub status: Option<String>,
    pub quantity: Option<String>,
    pub limit: Option<i64>,
}

impl AlertListParams {
    /// Parse the string filters into a typed [`AlertFilter`].
    pub fn into_filter(self) -> Result<AlertFilter, CoreError> {
        Ok(AlertFilter {
            artifact_id: self.artifact_id,
            device_id: self.device_id,
            status: self.status.as_deref().map(AlertStatus::parse).transpose()?,
            quantity: self.quantity.as_deref().map(Quantity::parse).transpose()?,
            limit: self.limit,
        })
    }
}
