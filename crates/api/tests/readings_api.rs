//! HTTP tests for reading ingestion and the artifact data reset.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, seed_artifact};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn breaching_reading_is_stored_with_its_alert(pool: PgPool) {
    let seeded = seed_artifact(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/readings",
        json!({
            "artifactId": seeded.artifact_id,
            "deviceId": seeded.device_id,
            "temp": 26.0,
            "hum": 45
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["reading"]["temperature"], 26.0);
    assert_eq!(data["reading"]["humidity"], 45.0);
    assert_eq!(data["alerts_created"], 1);
    assert_eq!(data["alerts"][0]["quantity"], "temperature");
    assert_eq!(data["alerts"][0]["direction"], "upper");
    assert_eq!(data["alerts"][0]["threshold_value"], 24.0);
    assert_eq!(data["alerts"][0]["status"], "active");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_breach_reuses_the_open_alert(pool: PgPool) {
    let seeded = seed_artifact(&pool).await;
    let app = common::build_test_app(pool);
    let body = json!({
        "artifact_id": seeded.artifact_id,
        "device_id": seeded.device_id,
        "temperature": 27.5
    });

    let first = body_json(post_json(app.clone(), "/api/v1/readings", body.clone()).await).await;
    let second = body_json(post_json(app, "/api/v1/readings", body).await).await;

    assert_eq!(first["data"]["alerts_created"], 1);
    assert_eq!(second["data"]["alerts_created"], 0);
    assert_eq!(
        first["data"]["alerts"][0]["id"],
        second["data"]["alerts"][0]["id"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reading_at_the_bound_opens_nothing(pool: PgPool) {
    let seeded = seed_artifact(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/readings",
        json!({
            "artifact_id": seeded.artifact_id,
            "device_id": seeded.device_id,
            "temperature": 24.0
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["alerts"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payload_without_artifact_is_rejected(pool: PgPool) {
    let seeded = seed_artifact(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/readings",
        json!({ "device_id": seeded.device_id, "temperature": 20.0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_object_payload_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/readings", json!([1, 2, 3])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reading_for_unknown_artifact_is_404(pool: PgPool) {
    let seeded = seed_artifact(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/readings",
        json!({ "artifact_id": 999_999, "device_id": seeded.device_id, "temperature": 20.0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_removes_readings_and_alerts(pool: PgPool) {
    let seeded = seed_artifact(&pool).await;
    let app = common::build_test_app(pool);
    post_json(
        app.clone(),
        "/api/v1/readings",
        json!({
            "artifact_id": seeded.artifact_id,
            "device_id": seeded.device_id,
            "temperature": 30.0
        }),
    )
    .await;

    let response = delete(
        app.clone(),
        &format!("/api/v1/artifacts/{}/data", seeded.artifact_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["alerts_deleted"], 1);
    assert_eq!(json["data"]["readings_deleted"], 1);

    let alerts = body_json(
        get(
            app,
            &format!("/api/v1/alerts?artifact_id={}", seeded.artifact_id),
        )
        .await,
    )
    .await;
    assert_eq!(alerts["data"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_of_unknown_artifact_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = delete(app, "/api/v1/artifacts/424242/data").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Artifact with id 424242 not found");
}
