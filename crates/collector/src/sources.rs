//! Collaborators the scheduler pulls from and pushes into.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use vitrine_core::types::DbId;
use vitrine_db::repositories::DeviceRepo;
use vitrine_pipeline::{IngestSummary, IngestionPipeline, PipelineError};

/// A device the collector should poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub device_id: DbId,
    pub artifact_id: DbId,
    pub external_device_id: String,
}

/// Lists the devices to poll on each cycle.
#[async_trait]
pub trait PollTargets: Send + Sync {
    async fn pollable(&self) -> Result<Vec<PollTarget>, sqlx::Error>;
}

/// Reads poll targets from the device registry.
pub struct RegistryTargets {
    pool: PgPool,
}

impl RegistryTargets {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PollTargets for RegistryTargets {
    async fn pollable(&self) -> Result<Vec<PollTarget>, sqlx::Error> {
        let devices = DeviceRepo::list_pollable(&self.pool).await?;
        Ok(devices
            .into_iter()
            .filter_map(|d| {
                Some(PollTarget {
                    device_id: d.id,
                    artifact_id: d.artifact_id?,
                    external_device_id: d.external_device_id?,
                })
            })
            .collect())
    }
}

/// Accepts raw samples for ingestion.
#[async_trait]
pub trait ReadingSink: Send + Sync {
    async fn submit(&self, raw: Map<String, Value>) -> Result<IngestSummary, PipelineError>;
}

#[async_trait]
impl ReadingSink for IngestionPipeline {
    async fn submit(&self, raw: Map<String, Value>) -> Result<IngestSummary, PipelineError> {
        self.ingest(&raw).await.map(|outcome| outcome.summary())
    }
}
