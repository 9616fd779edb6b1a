//! Alert email notifier.
//!
//! [`AlertMailer`] subscribes to the [`EventBus`](crate::bus::EventBus) and,
//! for every `alert.created` event, emails the artifact's curator. Delivery
//! is best-effort: failures are logged and never reach the ingestion path.

use std::sync::Arc;

use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use vitrine_core::types::{DbId, Timestamp};
use vitrine_db::repositories::ArtifactRepo;

use crate::bus::{PlatformEvent, EVENT_ALERT_CREATED};
use crate::delivery::email::MailTransport;

/// The subset of an alert the notification needs, read from the event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertNotice {
    pub id: DbId,
    pub artifact_id: DbId,
    pub device_id: DbId,
    pub quantity: String,
    pub direction: String,
    pub measured_value: f64,
    pub threshold_value: f64,
    pub detected_at: Timestamp,
}

/// Outcome of handling one event, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// Not an alert event, or the payload could not be read.
    Ignored,
    /// No recipient configured for the artifact.
    NoRecipient,
    Failed,
}

/// Background service that emails new alerts.
pub struct AlertMailer {
    pool: PgPool,
    transport: Arc<dyn MailTransport>,
    fallback_recipient: Option<String>,
}

impl AlertMailer {
    pub fn new(
        pool: PgPool,
        transport: Arc<dyn MailTransport>,
        fallback_recipient: Option<String>,
    ) -> Self {
        Self {
            pool,
            transport,
            fallback_recipient,
        }
    }

    /// Consume events until the bus closes or `cancel` fires.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Alert mailer started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Alert mailer stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        self.handle(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Alert mailer lagged, notifications lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, alert mailer stopping");
                        break;
                    }
                },
            }
        }
    }

    /// Handle a single event.
    pub async fn handle(&self, event: &PlatformEvent) -> Dispatch {
        if event.event_type != EVENT_ALERT_CREATED {
            return Dispatch::Ignored;
        }
        let notice: AlertNotice = match serde_json::from_value(event.payload.clone()) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable alert event payload");
                return Dispatch::Ignored;
            }
        };

        let artifact = match ArtifactRepo::find_by_id(&self.pool, notice.artifact_id).await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, alert_id = notice.id, "Artifact lookup failed");
                return Dispatch::Failed;
            }
        };
        let artifact_name = artifact
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| format!("artifact #{}", notice.artifact_id));
        let own_address = artifact.and_then(|a| a.notification_email);

        let Some(to) = choose_recipient(own_address, self.fallback_recipient.as_deref()) else {
            tracing::debug!(alert_id = notice.id, "No notification recipient, skipping");
            return Dispatch::NoRecipient;
        };

        let (subject, body) = render(&notice, &artifact_name);
        match self.transport.send(&to, &subject, &body).await {
            Ok(()) => Dispatch::Sent,
            Err(e) => {
                tracing::warn!(error = %e, alert_id = notice.id, "Alert email failed");
                Dispatch::Failed
            }
        }
    }
}

/// The artifact's own address wins over the global fallback.
pub fn choose_recipient(own: Option<String>, fallback: Option<&str>) -> Option<String> {
    own.filter(|s| !s.trim().is_empty())
        .or_else(|| fallback.map(str::to_string))
}

/// Subject and plain-text body for an alert notification.
pub fn render(notice: &AlertNotice, artifact_name: &str) -> (String, String) {
    let relation = if notice.direction == "lower" {
        "below"
    } else {
        "above"
    };
    let subject = format!(
        "[Vitrine] {} {relation} limit at {artifact_name}",
        notice.quantity
    );
    let body = format!(
        "Artifact: {artifact_name}\n\
         Device: #{}\n\
         Quantity: {}\n\
         Measured: {}\n\
         Limit ({}): {}\n\
         Detected at: {}\n\
         Alert id: {}\n",
        notice.device_id,
        notice.quantity,
        notice.measured_value,
        notice.direction,
        notice.threshold_value,
        notice.detected_at.to_rfc3339(),
        notice.id,
    );
    (subject, body)
}
