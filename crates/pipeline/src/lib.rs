//! Reading ingestion and alert lifecycle services.
//!
//! [`IngestionPipeline`] turns a raw reading into a stored reading plus the
//! alerts it triggers; [`AlertStore`] owns alert deduplication and status
//! changes. Both bound every database round trip by a configurable timeout.

pub mod alerts;
pub mod error;
pub mod ingest;
pub mod reset;

pub use alerts::{AlertStore, Reconciled};
pub use error::PipelineError;
pub use ingest::{IngestOutcome, IngestSummary, IngestionPipeline};
pub use reset::reset_artifact_data;

use std::future::Future;
use std::time::Duration;

use vitrine_core::error::CoreError;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a store call under `limit`; expiry becomes [`CoreError::Upstream`].
pub(crate) async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(PipelineError::from),
        Err(_) => Err(CoreError::Upstream(format!(
            "{what} did not complete within {}s",
            limit.as_secs()
        ))
        .into()),
    }
}
