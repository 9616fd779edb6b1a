//! Vitrine event bus and alert notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`delivery`]: SMTP email transport.
//! - [`AlertMailer`]: background consumer that emails the responsible
//!   curator when an alert is opened.

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{EventBus, PlatformEvent, EVENT_ALERT_CREATED};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, MailTransport};
pub use notifier::AlertMailer;
