//! Device-cloud client.
//!
//! The collector only needs "give me the latest sample of device X" from
//! the vendor cloud; [`DeviceCloud`] is that seam and [`HttpDeviceCloud`] is
//! the reqwest-backed implementation used in production.

pub mod http;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use http::{CloudConfig, HttpDeviceCloud};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Device cloud returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Device cloud did not answer within {0}s")]
    Timeout(u64),

    #[error("Unexpected device cloud payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid device cloud base URL '{0}'")]
    InvalidBaseUrl(String),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Source of raw device samples.
#[async_trait]
pub trait DeviceCloud: Send + Sync {
    /// Fetch the most recent raw sample reported by a device.
    ///
    /// The returned object uses vendor field names; normalization happens
    /// during ingestion.
    async fn fetch_latest(&self, external_device_id: &str) -> Result<Map<String, Value>, FetchError>;
}
