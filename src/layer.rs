//! A `tracing` layer that forwards events to a [`SlackLogHandler`].
//!
//! The event's `message` becomes the attachment text and every other field
//! becomes call-site metadata. A `severity` field naming a [`LogLevel`]
//! overrides the tracing level, which is how `notice` and `critical` events
//! are expressed:
//!
//! ```ignore
//! tracing::error!(severity = "critical", host = "db-2", "disk full");
//! ```

use crate::core::{LogLevel, Metadata, MetadataValue};
use crate::handler::{in_delivery, SlackLogHandler};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Crates on the delivery path. Their events are emitted by connection tasks
/// that outlive a single delivery, so they are ignored by target as well.
const TRANSPORT_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "h2", "rustls", "want"];

/// The field name that overrides an event's level.
pub const SEVERITY_FIELD: &str = "severity";

#[derive(Debug, Clone)]
pub struct SlackLayer {
    handler: SlackLogHandler,
}

impl SlackLayer {
    pub fn new(handler: SlackLogHandler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &SlackLogHandler {
        &self.handler
    }
}

impl<S: Subscriber> Layer<S> for SlackLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Anything logged while a notification is being delivered would
        // trigger another delivery.
        if in_delivery() {
            return;
        }

        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        // Bridged `log` records report their real target in a field.
        let target = visitor.log_target.as_deref().unwrap_or(metadata.target());
        if is_ignored_target(target) {
            return;
        }

        let level = visitor
            .severity
            .unwrap_or_else(|| LogLevel::from(*metadata.level()));
        self.handler
            .handle(level, visitor.message, Some(&visitor.fields));
    }
}

fn is_ignored_target(target: &str) -> bool {
    std::iter::once(OWN_TARGET)
        .chain(TRANSPORT_TARGETS.iter().copied())
        .any(|krate| is_within(target, krate))
}

fn is_within(target: &str, krate: &str) -> bool {
    target == krate
        || target
            .strip_prefix(krate)
            .is_some_and(|rest| rest.starts_with("::"))
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    severity: Option<LogLevel>,
    log_target: Option<String>,
    fields: Metadata,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            SEVERITY_FIELD => match value.parse() {
                Ok(level) => self.severity = Some(level),
                Err(_) => {
                    self.fields
                        .insert(SEVERITY_FIELD.to_string(), MetadataValue::from(value));
                }
            },
            "log.target" => self.log_target = Some(value.to_string()),
            // Bridged `log` records carry their call-site details as `log.*` fields.
            name if name.starts_with("log.") => {}
            name => {
                self.fields
                    .insert(name.to_string(), MetadataValue::from(value));
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }
}
