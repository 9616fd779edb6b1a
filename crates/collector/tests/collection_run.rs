//! End-to-end collection against a real database: repeated breaching
//! samples must leave exactly one active alert.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use vitrine_cloud::{DeviceCloud, FetchError};
use vitrine_collector::{CollectionScheduler, RegistryTargets};
use vitrine_core::alert::AlertStatus;
use vitrine_core::thresholds::MaterialThresholds;
use vitrine_db::models::alert::AlertFilter;
use vitrine_db::models::catalog::{CreateArtifact, CreateDevice, CreateMaterial};
use vitrine_db::repositories::{AlertRepo, ArtifactRepo, DeviceRepo, MaterialRepo, ReadingRepo};
use vitrine_events::EventBus;
use vitrine_pipeline::IngestionPipeline;

struct HotCloud;

#[async_trait]
impl DeviceCloud for HotCloud {
    async fn fetch_latest(&self, _external_device_id: &str) -> Result<Map<String, Value>, FetchError> {
        Ok(json!({"temperature": 29.5, "relativeHumidity": 45})
            .as_object()
            .cloned()
            .unwrap_or_default())
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_repeated_breaches_leave_one_active_alert(pool: PgPool) {
    let material = MaterialRepo::create(
        &pool,
        &CreateMaterial {
            name: "Parchment".to_string(),
            thresholds: MaterialThresholds {
                temperature_upper: Some(22.0),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();
    let artifact = ArtifactRepo::create(
        &pool,
        &CreateArtifact {
            name: "Charter".to_string(),
            material_id: Some(material.id),
            notification_email: None,
        },
    )
    .await
    .unwrap();
    let device = DeviceRepo::create(
        &pool,
        &CreateDevice {
            artifact_id: Some(artifact.id),
            external_device_id: Some("vendor-77".to_string()),
            name: "Vault sensor".to_string(),
            maintenance: false,
        },
    )
    .await
    .unwrap();

    let pipeline = IngestionPipeline::new(
        pool.clone(),
        Arc::new(EventBus::default()),
        Duration::from_secs(5),
    );
    let scheduler = CollectionScheduler::new(
        Arc::new(RegistryTargets::new(pool.clone())),
        Arc::new(HotCloud),
        Arc::new(pipeline),
        Duration::from_secs(5),
    );

    scheduler.start(1, 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let status = scheduler.status().await;
    scheduler.stop().await;

    assert!(status.succeeded >= 2, "status: {status:?}");
    assert_eq!(status.failed, 0);
    assert_eq!(status.alerts_created, 1);

    let readings = ReadingRepo::list_for_artifact(&pool, artifact.id, 100)
        .await
        .unwrap();
    assert!(readings.len() >= 2);
    assert!(readings.iter().all(|r| r.device_id == device.id));

    let active = AlertRepo::list(
        &pool,
        &AlertFilter {
            artifact_id: Some(artifact.id),
            status: Some(AlertStatus::Active),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].quantity, "temperature");

    let device = DeviceRepo::find_by_id(&pool, device.id).await.unwrap().unwrap();
    assert!(device.last_seen_at.is_some());
}
