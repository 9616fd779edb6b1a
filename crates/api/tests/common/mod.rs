#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use vitrine_api::config::ServerConfig;
use vitrine_api::router::build_app_router;
use vitrine_api::state::AppState;
use vitrine_cloud::{DeviceCloud, FetchError};
use vitrine_collector::{CollectionScheduler, RegistryTargets};
use vitrine_core::thresholds::MaterialThresholds;
use vitrine_db::models::catalog::{CreateArtifact, CreateDevice, CreateMaterial};
use vitrine_db::repositories::{ArtifactRepo, DeviceRepo, MaterialRepo};
use vitrine_events::EventBus;
use vitrine_pipeline::IngestionPipeline;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_timeout_secs: 10,
        device_offline_after_mins: 60,
        device_stale_after_mins: 1440,
    }
}

/// Device cloud that always reports the same sample.
pub struct FixedCloud {
    pub sample: Map<String, Value>,
}

#[async_trait]
impl DeviceCloud for FixedCloud {
    async fn fetch_latest(&self, _external_device_id: &str) -> Result<Map<String, Value>, FetchError> {
        Ok(self.sample.clone())
    }
}

/// Build the full application router, sharing the production middleware
/// stack, over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let pipeline = IngestionPipeline::new(
        pool.clone(),
        Arc::clone(&event_bus),
        Duration::from_secs(config.store_timeout_secs),
    );

    let mut sample = Map::new();
    sample.insert("temperature".into(), json!(21.0));
    let scheduler = CollectionScheduler::new(
        Arc::new(RegistryTargets::new(pool.clone())),
        Arc::new(FixedCloud { sample }),
        Arc::new(pipeline.clone()),
        Duration::from_secs(5),
    );

    let state = AppState {
        pool,
        device_policy: config.device_status_policy(),
        pipeline,
        scheduler,
    };

    build_app_router(state, &config).expect("test config is valid")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Seeded {
    pub artifact_id: i64,
    pub device_id: i64,
}

/// Seed one artifact with a paper-like material (temperature 16..24) and one
/// device linked to it.
pub async fn seed_artifact(pool: &PgPool) -> Seeded {
    let material = MaterialRepo::create(
        pool,
        &CreateMaterial {
            name: "Paper".to_string(),
            thresholds: MaterialThresholds {
                temperature_lower: Some(16.0),
                temperature_upper: Some(24.0),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();
    let artifact = ArtifactRepo::create(
        pool,
        &CreateArtifact {
            name: "Herbarium sheet".to_string(),
            material_id: Some(material.id),
            notification_email: None,
        },
    )
    .await
    .unwrap();
    let device = DeviceRepo::create(
        pool,
        &CreateDevice {
            artifact_id: Some(artifact.id),
            external_device_id: Some("cloud-1".to_string()),
            name: "Case sensor".to_string(),
            maintenance: false,
        },
    )
    .await
    .unwrap();

    Seeded {
        artifact_id: artifact.id,
        device_id: device.id,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri, None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
