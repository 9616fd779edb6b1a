use vitrine_collector::CollectionScheduler;
use vitrine_core::device_status::DeviceStatusPolicy;
use vitrine_pipeline::IngestionPipeline;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything inside is a pool, an `Arc`, or a handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: vitrine_db::DbPool,
    pub pipeline: IngestionPipeline,
    pub scheduler: CollectionScheduler,
    pub device_policy: DeviceStatusPolicy,
}
