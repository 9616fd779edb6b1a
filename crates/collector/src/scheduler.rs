//! Collection-run state machine.
//!
//! `Stopped -> Running -> {Paused -> Running, Stopped}`. One tokio task
//! drives the running part of a run; pausing cancels it and resuming spawns
//! a fresh one. Cancellation takes effect between devices, so an ingest that
//! has started always finishes. Every result is tagged with the run id and segment that
//! produced it and dropped if the run has since been paused, stopped or
//! replaced.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vitrine_cloud::{DeviceCloud, FetchError};
use vitrine_core::error::CoreError;
use vitrine_core::reading::canonical_field_name;
use vitrine_pipeline::{IngestSummary, PipelineError};

use crate::sources::{PollTarget, PollTargets, ReadingSink};
use crate::status::{CollectionStatus, RunStatus};

/// Default bound on one device fetch and on the device listing.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Longest run accepted by [`CollectionScheduler::start`] (one week).
pub const MAX_DURATION_MINUTES: u64 = 7 * 24 * 60;

/// Longest polling interval accepted (one day).
pub const MAX_INTERVAL_SECONDS: u64 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum CollectError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("ingest failed: {0}")]
    Ingest(#[from] PipelineError),
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

struct CollectionRun {
    run_id: Uuid,
    /// Bumped on every resume so a paused segment's task cannot write.
    segment: u64,
    duration: Duration,
    interval: Duration,
    status: RunStatus,
    /// Running time accumulated by finished segments.
    elapsed_before: Duration,
    running_since: Option<Instant>,
    next_due: Option<Instant>,
    /// Time left until the next fetch when the run was paused.
    resume_delay: Duration,
    attempted: u64,
    succeeded: u64,
    failed: u64,
    alerts_created: u64,
    last_fetch_at: Option<DateTime<Utc>>,
    message: Option<String>,
    cancel: CancellationToken,
}

impl CollectionRun {
    fn new(duration: Duration, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            segment: 0,
            duration,
            interval,
            status: RunStatus::Running,
            elapsed_before: Duration::ZERO,
            running_since: Some(Instant::now()),
            next_due: None,
            resume_delay: Duration::ZERO,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            alerts_created: 0,
            last_fetch_at: None,
            message: Some("Collection started".to_string()),
            cancel,
        }
    }

    fn is_current(&self, run_id: Uuid, segment: u64) -> bool {
        self.run_id == run_id && self.segment == segment && self.status == RunStatus::Running
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.elapsed_before
            + self
                .running_since
                .map(|since| now.saturating_duration_since(since))
                .unwrap_or_default()
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    fn snapshot(&self, now: Instant) -> CollectionStatus {
        let next_fetch_at = match (self.status, self.next_due) {
            (RunStatus::Running, Some(due)) => {
                chrono::Duration::from_std(due.saturating_duration_since(now))
                    .ok()
                    .map(|wait| Utc::now() + wait)
            }
            _ => None,
        };
        CollectionStatus {
            run_id: Some(self.run_id),
            status: self.status,
            duration_secs: self.duration.as_secs(),
            interval_secs: self.interval.as_secs(),
            elapsed_secs: self.elapsed(now).as_secs(),
            remaining_secs: self.remaining(now).as_secs(),
            attempted: self.attempted,
            succeeded: self.succeeded,
            failed: self.failed,
            alerts_created: self.alerts_created,
            last_fetch_at: self.last_fetch_at,
            next_fetch_at,
            message: self.message.clone(),
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    run: Option<CollectionRun>,
    task: Option<JoinHandle<()>>,
    /// Outcome of the last finished or stopped run.
    last_message: Option<String>,
}

struct Inner {
    targets: Arc<dyn PollTargets>,
    cloud: Arc<dyn DeviceCloud>,
    sink: Arc<dyn ReadingSink>,
    fetch_timeout: Duration,
    shutdown: CancellationToken,
    state: Mutex<SchedulerState>,
}

// ---------------------------------------------------------------------------
// CollectionScheduler
// ---------------------------------------------------------------------------

/// Owns the polling loop and its cancellation.
///
/// Cheap to clone; clones share the same run.
#[derive(Clone)]
pub struct CollectionScheduler {
    inner: Arc<Inner>,
}

impl CollectionScheduler {
    pub fn new(
        targets: Arc<dyn PollTargets>,
        cloud: Arc<dyn DeviceCloud>,
        sink: Arc<dyn ReadingSink>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                targets,
                cloud,
                sink,
                fetch_timeout,
                shutdown: CancellationToken::new(),
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Start a run of `duration_minutes` running time, polling every
    /// `interval_seconds`. The first cycle runs immediately.
    pub async fn start(
        &self,
        duration_minutes: u64,
        interval_seconds: u64,
    ) -> Result<CollectionStatus, CoreError> {
        validate_run_parameters(duration_minutes, interval_seconds)?;

        let mut state = self.inner.state.lock().await;
        if self.inner.shutdown.is_cancelled() {
            return Err(CoreError::Conflict("Collector is shutting down".into()));
        }
        if let Some(run) = &state.run {
            return Err(CoreError::Conflict(format!(
                "Collection is already {}",
                run.status.as_str()
            )));
        }

        let run = CollectionRun::new(
            Duration::from_secs(duration_minutes * 60),
            Duration::from_secs(interval_seconds),
            self.inner.shutdown.child_token(),
        );
        let snapshot = run.snapshot(Instant::now());
        state.task = Some(tokio::spawn(run_segment(
            self.inner.clone(),
            run.run_id,
            run.segment,
            run.cancel.clone(),
            Duration::ZERO,
        )));

        tracing::info!(
            run_id = %run.run_id,
            duration_minutes,
            interval_seconds,
            "Collection started"
        );
        state.run = Some(run);
        Ok(snapshot)
    }

    /// Suspend the run. No fetches happen and elapsed time stands still
    /// until [`resume`](Self::resume).
    pub async fn pause(&self) -> Result<CollectionStatus, CoreError> {
        let (task, snapshot) = {
            let mut state = self.inner.state.lock().await;
            let now = Instant::now();
            let run = match state.run.as_mut() {
                Some(run) if run.status == RunStatus::Running => run,
                Some(_) => return Err(CoreError::Conflict("Collection is already paused".into())),
                None => return Err(CoreError::Conflict("No collection run to pause".into())),
            };

            run.elapsed_before = run.elapsed(now);
            run.running_since = None;
            run.resume_delay = run
                .next_due
                .map(|due| due.saturating_duration_since(now))
                .unwrap_or_default();
            run.next_due = None;
            run.status = RunStatus::Paused;
            run.message = Some("Collection paused".to_string());
            run.cancel.cancel();
            tracing::info!(run_id = %run.run_id, elapsed_secs = run.elapsed_before.as_secs(), "Collection paused");

            let snapshot = run.snapshot(now);
            (state.task.take(), snapshot)
        };

        if let Some(task) = task {
            let _ = task.await;
        }
        Ok(snapshot)
    }

    /// Continue a paused run where it left off.
    pub async fn resume(&self) -> Result<CollectionStatus, CoreError> {
        let mut state = self.inner.state.lock().await;
        if self.inner.shutdown.is_cancelled() {
            return Err(CoreError::Conflict("Collector is shutting down".into()));
        }
        let now = Instant::now();
        let run = match state.run.as_mut() {
            Some(run) if run.status == RunStatus::Paused => run,
            Some(_) => return Err(CoreError::Conflict("Collection is already running".into())),
            None => return Err(CoreError::Conflict("No collection run to resume".into())),
        };

        run.segment += 1;
        run.status = RunStatus::Running;
        run.running_since = Some(now);
        run.next_due = Some(now + run.resume_delay);
        run.cancel = self.inner.shutdown.child_token();
        run.message = Some("Collection resumed".to_string());

        let task = tokio::spawn(run_segment(
            self.inner.clone(),
            run.run_id,
            run.segment,
            run.cancel.clone(),
            run.resume_delay,
        ));
        tracing::info!(run_id = %run.run_id, "Collection resumed");
        let snapshot = run.snapshot(now);
        state.task = Some(task);
        Ok(snapshot)
    }

    /// Stop and discard the current run. The polling task has exited when
    /// this returns. Stopping an idle scheduler is a no-op.
    pub async fn stop(&self) -> CollectionStatus {
        let task = {
            let mut state = self.inner.state.lock().await;
            if let Some(run) = state.run.take() {
                run.cancel.cancel();
                tracing::info!(
                    run_id = %run.run_id,
                    attempted = run.attempted,
                    "Collection stopped"
                );
                state.last_message = Some(format!(
                    "Collection stopped after {} fetches ({} failed)",
                    run.attempted, run.failed
                ));
            }
            state.task.take()
        };

        if let Some(task) = task {
            let _ = task.await;
        }
        self.status().await
    }

    pub async fn status(&self) -> CollectionStatus {
        let state = self.inner.state.lock().await;
        match &state.run {
            Some(run) => run.snapshot(Instant::now()),
            None => CollectionStatus::stopped(state.last_message.clone()),
        }
    }

    /// Stop any run and refuse new ones. Called once at server shutdown.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.stop().await;
    }
}

fn validate_run_parameters(duration_minutes: u64, interval_seconds: u64) -> Result<(), CoreError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(CoreError::Validation(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}"
        )));
    }
    if !(1..=MAX_INTERVAL_SECONDS).contains(&interval_seconds) {
        return Err(CoreError::Validation(format!(
            "interval_seconds must be between 1 and {MAX_INTERVAL_SECONDS}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Polling task
// ---------------------------------------------------------------------------

/// Drive one running segment until it is cancelled or the run's duration
/// is used up.
async fn run_segment(
    inner: Arc<Inner>,
    run_id: Uuid,
    segment: u64,
    cancel: CancellationToken,
    first_delay: Duration,
) {
    let mut next_due = Instant::now() + first_delay;

    loop {
        let Some((remaining, interval)) = inner.timing(run_id, segment, next_due).await else {
            return;
        };
        let end = Instant::now() + remaining;

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep_until(next_due.min(end)) => {}
        }

        if Instant::now() >= end {
            inner.complete(run_id, segment).await;
            return;
        }

        // Publish the next deadline before the cycle so a pause during the
        // cycle keeps the remaining wait.
        next_due = Instant::now() + interval;
        if inner.timing(run_id, segment, next_due).await.is_none() {
            return;
        }

        // Not raced against `cancel`: an ingest that has started runs to
        // completion, and `record` drops its result if the run moved on.
        inner.run_cycle(run_id, segment, &cancel).await;
        if cancel.is_cancelled() {
            return;
        }
    }
}

impl Inner {
    /// Remaining running time and interval of the segment, recording when
    /// the next fetch is due. `None` once the segment is no longer current.
    async fn timing(
        &self,
        run_id: Uuid,
        segment: u64,
        next_due: Instant,
    ) -> Option<(Duration, Duration)> {
        let mut state = self.state.lock().await;
        let run = state.run.as_mut().filter(|r| r.is_current(run_id, segment))?;
        let remaining = run.remaining(Instant::now());
        run.next_due = Some(next_due);
        Some((remaining, run.interval))
    }

    async fn complete(&self, run_id: Uuid, segment: u64) {
        let mut state = self.state.lock().await;
        if !state
            .run
            .as_ref()
            .is_some_and(|r| r.is_current(run_id, segment))
        {
            return;
        }
        if let Some(run) = state.run.take() {
            tracing::info!(
                run_id = %run.run_id,
                attempted = run.attempted,
                succeeded = run.succeeded,
                failed = run.failed,
                "Collection finished"
            );
            state.last_message = Some(format!(
                "Collection finished: {} of {} fetches succeeded",
                run.succeeded, run.attempted
            ));
        }
        state.task = None;
    }

    async fn run_cycle(&self, run_id: Uuid, segment: u64, cancel: &CancellationToken) {
        let targets = match tokio::time::timeout(self.fetch_timeout, self.targets.pollable()).await
        {
            Ok(Ok(targets)) => targets,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, %run_id, "Listing pollable devices failed");
                self.note(run_id, segment, format!("Device listing failed: {e}")).await;
                return;
            }
            Err(_) => {
                tracing::warn!(%run_id, "Listing pollable devices timed out");
                self.note(run_id, segment, "Device listing timed out".to_string())
                    .await;
                return;
            }
        };

        if targets.is_empty() {
            self.note(run_id, segment, "No devices to poll".to_string()).await;
        }

        for target in &targets {
            if cancel.is_cancelled() {
                return;
            }
            let outcome = self.collect_one(target).await;
            if !self.record(run_id, segment, target, outcome).await {
                return;
            }
        }

        let mut state = self.state.lock().await;
        if let Some(run) = state.run.as_mut().filter(|r| r.is_current(run_id, segment)) {
            run.last_fetch_at = Some(Utc::now());
            if !targets.is_empty() {
                run.message = Some(format!(
                    "Polled {} devices ({} ok, {} failed so far)",
                    targets.len(),
                    run.succeeded,
                    run.failed
                ));
            }
        }
    }

    async fn collect_one(&self, target: &PollTarget) -> Result<IngestSummary, CollectError> {
        let raw = match tokio::time::timeout(
            self.fetch_timeout,
            self.cloud.fetch_latest(&target.external_device_id),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout(self.fetch_timeout.as_secs()).into()),
        };
        let summary = self.sink.submit(with_identity(raw, target)).await?;
        Ok(summary)
    }

    /// Apply one fetch result. Returns `false` if the segment is no longer
    /// current and the result was dropped.
    async fn record(
        &self,
        run_id: Uuid,
        segment: u64,
        target: &PollTarget,
        outcome: Result<IngestSummary, CollectError>,
    ) -> bool {
        let mut state = self.state.lock().await;
        let Some(run) = state.run.as_mut().filter(|r| r.is_current(run_id, segment)) else {
            tracing::debug!(%run_id, device_id = target.device_id, "Dropping result of superseded run");
            return false;
        };

        run.attempted += 1;
        match outcome {
            Ok(summary) => {
                run.succeeded += 1;
                run.alerts_created += summary.alerts_created as u64;
            }
            Err(e) => {
                run.failed += 1;
                tracing::warn!(
                    error = %e,
                    device_id = target.device_id,
                    external_device_id = %target.external_device_id,
                    "Device collection failed"
                );
                run.message = Some(format!(
                    "Device {} failed: {e}",
                    target.external_device_id
                ));
            }
        }
        true
    }

    async fn note(&self, run_id: Uuid, segment: u64, message: String) {
        let mut state = self.state.lock().await;
        if let Some(run) = state.run.as_mut().filter(|r| r.is_current(run_id, segment)) {
            run.message = Some(message);
        }
    }
}

/// Stamp the registry's ids onto a vendor sample, replacing whatever ids
/// the vendor used.
fn with_identity(mut raw: Map<String, Value>, target: &PollTarget) -> Map<String, Value> {
    raw.retain(|key, _| {
        !matches!(
            canonical_field_name(key).as_str(),
            "artifact_id" | "device_id"
        )
    });
    raw.insert("artifact_id".to_string(), json!(target.artifact_id));
    raw.insert("device_id".to_string(), json!(target.device_id));
    raw
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
