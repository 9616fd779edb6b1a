//! Reading ingestion.
//!
//! One call per incoming sample, whether pushed over HTTP or pulled by the
//! collector: validate and normalize, store, evaluate against the
//! artifact's material thresholds, reconcile each breach into an alert.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use vitrine_core::error::CoreError;
use vitrine_core::reading::{normalize, NormalizedReading};
use vitrine_core::thresholds::evaluate;
use vitrine_core::types::DbId;
use vitrine_db::models::alert::Alert;
use vitrine_db::models::reading::Reading;
use vitrine_db::repositories::{DeviceRepo, MaterialRepo, ReadingRepo};
use vitrine_events::{EventBus, PlatformEvent, EVENT_ALERT_CREATED};

use crate::alerts::{AlertStore, Reconciled};
use crate::error::foreign_key_violation;
use crate::{bounded, PipelineError};

/// Stored reading plus every alert it matched or opened.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub alerts: Vec<Alert>,
    /// How many of `alerts` were opened by this reading.
    pub alerts_created: usize,
}

/// Compact form of [`IngestOutcome`] for callers that only count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub reading_id: DbId,
    pub alerts: usize,
    pub alerts_created: usize,
}

impl IngestOutcome {
    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            reading_id: self.reading.id,
            alerts: self.alerts.len(),
            alerts_created: self.alerts_created,
        }
    }
}

/// The ingestion service.
#[derive(Clone)]
pub struct IngestionPipeline {
    pool: PgPool,
    events: Arc<EventBus>,
    alerts: AlertStore,
    timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(pool: PgPool, events: Arc<EventBus>, timeout: Duration) -> Self {
        let alerts = AlertStore::new(pool.clone(), timeout);
        Self {
            pool,
            events,
            alerts,
            timeout,
        }
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    /// Ingest one raw reading.
    pub async fn ingest(&self, raw: &Map<String, Value>) -> Result<IngestOutcome, PipelineError> {
        let normalized = normalize(raw, Utc::now())?;

        let reading = bounded(
            self.timeout,
            "reading insert",
            ReadingRepo::insert(&self.pool, &normalized),
        )
        .await
        .map_err(|e| map_reading_reference_error(e, &normalized))?;

        self.touch_device(&reading).await;

        let thresholds = bounded(
            self.timeout,
            "threshold lookup",
            MaterialRepo::thresholds_for_artifact(&self.pool, reading.artifact_id),
        )
        .await?;

        let Some(thresholds) = thresholds else {
            tracing::debug!(
                reading_id = reading.id,
                artifact_id = reading.artifact_id,
                "No material thresholds, skipping evaluation"
            );
            return Ok(IngestOutcome {
                reading,
                alerts: Vec::new(),
                alerts_created: 0,
            });
        };

        let candidates = evaluate(&reading.snapshot(), &thresholds);
        let mut alerts = Vec::with_capacity(candidates.len());
        let mut alerts_created = 0;

        for candidate in &candidates {
            let Reconciled { alert, created } = self.alerts.reconcile(candidate).await?;
            if created {
                alerts_created += 1;
                self.publish_created(&alert);
            }
            alerts.push(alert);
        }

        tracing::debug!(
            reading_id = reading.id,
            breaches = candidates.len(),
            alerts_created,
            "Reading ingested"
        );

        Ok(IngestOutcome {
            reading,
            alerts,
            alerts_created,
        })
    }

    /// Best-effort `last_seen_at` bookkeeping; never fails the ingest.
    async fn touch_device(&self, reading: &Reading) {
        let touched = bounded(
            self.timeout,
            "device touch",
            DeviceRepo::touch_last_seen(&self.pool, reading.device_id, reading.recorded_at),
        )
        .await;
        if let Err(e) = touched {
            tracing::warn!(
                error = %e,
                device_id = reading.device_id,
                "Failed to update device last_seen_at"
            );
        }
    }

    fn publish_created(&self, alert: &Alert) {
        match serde_json::to_value(alert) {
            Ok(payload) => self.events.publish(
                PlatformEvent::new(EVENT_ALERT_CREATED)
                    .with_source("alert", alert.id)
                    .with_payload(payload),
            ),
            Err(e) => tracing::warn!(error = %e, alert_id = alert.id, "Alert event not published"),
        }
    }
}

fn map_reading_reference_error(err: PipelineError, reading: &NormalizedReading) -> PipelineError {
    let PipelineError::Database(ref db) = err else {
        return err;
    };
    match foreign_key_violation(db) {
        Some("fk_readings_artifact") => CoreError::NotFound {
            entity: "Artifact",
            id: reading.artifact_id,
        }
        .into(),
        Some("fk_readings_device") => CoreError::NotFound {
            entity: "Device",
            id: reading.device_id,
        }
        .into(),
        _ => err,
    }
}
