//! Integration tests for the alert store and reading repository.
//!
//! Exercises the partial unique index on active alerts, status transitions
//! and artifact data purges against a real database.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use vitrine_core::alert::{AlertStatus, BreachCandidate, BreachDirection};
use vitrine_core::quantity::Quantity;
use vitrine_core::reading::{NormalizedReading, ReadingValues};
use vitrine_core::thresholds::MaterialThresholds;
use vitrine_db::models::alert::AlertFilter;
use vitrine_db::models::catalog::{CreateArtifact, CreateDevice, CreateMaterial};
use vitrine_db::repositories::alert_repo::ACTIVE_KEY_CONSTRAINT;
use vitrine_db::repositories::{
    AlertRepo, ArtifactRepo, DeviceRepo, MaterialRepo, ReadingRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    artifact_id: i64,
    device_id: i64,
}

async fn seed(pool: &PgPool) -> Fixture {
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
            external_device_id: Some("ext-1".to_string()),
            name: "Case 4 sensor".to_string(),
            maintenance: false,
        },
    )
    .await
    .unwrap();
    Fixture {
        artifact_id: artifact.id,
        device_id: device.id,
    }
}

async fn insert_reading(pool: &PgPool, fx: &Fixture, temperature: f64) -> i64 {
    let reading = NormalizedReading {
        artifact_id: fx.artifact_id,
        device_id: fx.device_id,
        recorded_at: Utc::now(),
        values: ReadingValues {
            temperature: Some(temperature),
            ..Default::default()
        },
    };
    ReadingRepo::insert(pool, &reading).await.unwrap().id
}

fn candidate(fx: &Fixture, reading_id: i64, measured: f64) -> BreachCandidate {
    BreachCandidate {
        artifact_id: fx.artifact_id,
        device_id: fx.device_id,
        reading_id,
        quantity: Quantity::Temperature,
        direction: BreachDirection::Upper,
        measured_value: measured,
        threshold_value: 24.0,
        detected_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Active-key uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_insert_for_same_key_is_a_no_op(pool: PgPool) {
    let fx = seed(&pool).await;
    let r1 = insert_reading(&pool, &fx, 26.0).await;
    let r2 = insert_reading(&pool, &fx, 27.0).await;

    let first = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r1, 26.0))
        .await
        .unwrap();
    assert!(first.is_some());

    let second = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r2, 27.0))
        .await
        .unwrap();
    assert!(second.is_none(), "active key already taken");

    let active = AlertRepo::find_active(
        &pool,
        fx.artifact_id,
        Quantity::Temperature,
        BreachDirection::Upper,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(active.id, first.unwrap().id);
    assert_eq!(active.reading_id, r1, "first detection is preserved");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_opposite_direction_is_a_separate_key(pool: PgPool) {
    let fx = seed(&pool).await;
    let r = insert_reading(&pool, &fx, 26.0).await;

    let mut lower = candidate(&fx, r, 10.0);
    lower.direction = BreachDirection::Lower;
    lower.threshold_value = 16.0;

    assert!(AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 26.0))
        .await
        .unwrap()
        .is_some());
    assert!(AlertRepo::insert_if_no_active(&pool, &lower)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_inserts_create_exactly_one_alert(pool: PgPool) {
    let fx = seed(&pool).await;
    let r = insert_reading(&pool, &fx, 26.0).await;

    let attempts = (0..8).map(|i| {
        let pool = pool.clone();
        let c = candidate(&fx, r, 26.0 + f64::from(i));
        async move { AlertRepo::insert_if_no_active(&pool, &c).await }
    });
    let results = futures::future::join_all(attempts).await;

    let created = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Option::is_some)
        .count();
    assert_eq!(created, 1);

    let all = AlertRepo::list(&pool, &AlertFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dismiss_stamps_and_frees_the_key(pool: PgPool) {
    let fx = seed(&pool).await;
    let r = insert_reading(&pool, &fx, 26.0).await;
    let alert = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 26.0))
        .await
        .unwrap()
        .unwrap();
    assert!(alert.is_active());
    assert!(alert.dismissed_at.is_none());

    let dismissed = AlertRepo::set_status(&pool, alert.id, AlertStatus::Dismissed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dismissed.status, "dismissed");
    assert!(dismissed.dismissed_at.is_some());
    assert!(dismissed.updated_at.is_some());

    // The key is free again, so a new breach opens a new alert.
    let fresh = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 28.0))
        .await
        .unwrap()
        .unwrap();
    assert_ne!(fresh.id, alert.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reactivate_clears_dismissed_at(pool: PgPool) {
    let fx = seed(&pool).await;
    let r = insert_reading(&pool, &fx, 26.0).await;
    let alert = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 26.0))
        .await
        .unwrap()
        .unwrap();

    AlertRepo::set_status(&pool, alert.id, AlertStatus::Dismissed)
        .await
        .unwrap();
    let active = AlertRepo::set_status(&pool, alert.id, AlertStatus::Active)
        .await
        .unwrap()
        .unwrap();
    assert!(active.is_active());
    assert!(active.dismissed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reactivate_while_key_taken_violates_active_index(pool: PgPool) {
    let fx = seed(&pool).await;
    let r = insert_reading(&pool, &fx, 26.0).await;
    let old = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 26.0))
        .await
        .unwrap()
        .unwrap();
    AlertRepo::set_status(&pool, old.id, AlertStatus::Dismissed)
        .await
        .unwrap();
    AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 27.0))
        .await
        .unwrap()
        .unwrap();

    let err = AlertRepo::set_status(&pool, old.id, AlertStatus::Active)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        sqlx::Error::Database(ref db) if db.constraint() == Some(ACTIVE_KEY_CONSTRAINT)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_status_on_missing_alert_returns_none(pool: PgPool) {
    let result = AlertRepo::set_status(&pool, 999_999, AlertStatus::Dismissed)
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_status_and_orders_newest_first(pool: PgPool) {
    let fx = seed(&pool).await;
    let r = insert_reading(&pool, &fx, 26.0).await;

    let mut older = candidate(&fx, r, 26.0);
    older.detected_at = Utc::now() - Duration::hours(2);
    let older = AlertRepo::insert_if_no_active(&pool, &older)
        .await
        .unwrap()
        .unwrap();
    AlertRepo::set_status(&pool, older.id, AlertStatus::Dismissed)
        .await
        .unwrap();
    let newer = AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r, 27.0))
        .await
        .unwrap()
        .unwrap();

    let all = AlertRepo::list(&pool, &AlertFilter::default()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let active = AlertRepo::list(
        &pool,
        &AlertFilter {
            status: Some(AlertStatus::Active),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, newer.id);

    let limited = AlertRepo::list(
        &pool,
        &AlertFilter {
            limit: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(limited.len(), 1);

    let other_quantity = AlertRepo::list(
        &pool,
        &AlertFilter {
            quantity: Some(Quantity::Humidity),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(other_quantity.is_empty());
}

// ---------------------------------------------------------------------------
// Catalog lookups and purge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_thresholds_for_artifact_follow_material(pool: PgPool) {
    let fx = seed(&pool).await;
    let thresholds = MaterialRepo::thresholds_for_artifact(&pool, fx.artifact_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(thresholds.temperature_upper, Some(24.0));
    assert_eq!(thresholds.humidity_upper, None);

    let bare = ArtifactRepo::create(
        &pool,
        &CreateArtifact {
            name: "Unclassified".to_string(),
            material_id: None,
            notification_email: None,
        },
    )
    .await
    .unwrap();
    assert!(MaterialRepo::thresholds_for_artifact(&pool, bare.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_touch_last_seen_never_moves_backwards(pool: PgPool) {
    let fx = seed(&pool).await;
    let now = Utc::now();

    assert!(DeviceRepo::touch_last_seen(&pool, fx.device_id, now).await.unwrap());
    DeviceRepo::touch_last_seen(&pool, fx.device_id, now - Duration::hours(3))
        .await
        .unwrap();

    let device = DeviceRepo::find_by_id(&pool, fx.device_id).await.unwrap().unwrap();
    let seen = device.last_seen_at.unwrap();
    assert!((seen - now).num_milliseconds().abs() < 1);

    assert!(!DeviceRepo::touch_last_seen(&pool, 999_999, now).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pollable_devices_exclude_maintenance_and_unlinked(pool: PgPool) {
    let fx = seed(&pool).await;
    let push_only = DeviceRepo::create(
        &pool,
        &CreateDevice {
            artifact_id: Some(fx.artifact_id),
            external_device_id: None,
            name: "Push sensor".to_string(),
            maintenance: false,
        },
    )
    .await
    .unwrap();
    let serviced = DeviceRepo::create(
        &pool,
        &CreateDevice {
            artifact_id: Some(fx.artifact_id),
            external_device_id: Some("ext-2".to_string()),
            name: "Serviced sensor".to_string(),
            maintenance: true,
        },
    )
    .await
    .unwrap();

    let pollable = DeviceRepo::list_pollable(&pool).await.unwrap();
    let ids: Vec<i64> = pollable.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![fx.device_id]);
    assert!(!ids.contains(&push_only.id));
    assert!(!ids.contains(&serviced.id));

    assert_eq!(DeviceRepo::list_all(&pool).await.unwrap().len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_purge_removes_alerts_and_readings_of_one_artifact(pool: PgPool) {
    let fx = seed(&pool).await;
    let r1 = insert_reading(&pool, &fx, 26.0).await;
    insert_reading(&pool, &fx, 20.0).await;
    AlertRepo::insert_if_no_active(&pool, &candidate(&fx, r1, 26.0))
        .await
        .unwrap();

    let summary = ReadingRepo::purge_artifact_data(&pool, fx.artifact_id)
        .await
        .unwrap();
    assert_eq!(summary.alerts_deleted, 1);
    assert_eq!(summary.readings_deleted, 2);

    assert!(ReadingRepo::find_by_id(&pool, r1).await.unwrap().is_none());
    assert!(ReadingRepo::list_for_artifact(&pool, fx.artifact_id, 10)
        .await
        .unwrap()
        .is_empty());
    // Catalog rows survive a purge.
    assert!(DeviceRepo::find_by_id(&pool, fx.device_id).await.unwrap().is_some());
}
