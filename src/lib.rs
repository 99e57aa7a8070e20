/// slacklog - forward log events to a Slack incoming webhook
///
/// A [`SlackLogHandler`] filters events by severity, merges metadata and
/// posts one attachment per event. [`SlackLayer`] plugs the handler into a
/// `tracing` subscriber.
pub mod appearance;
pub mod cli;
pub mod config;
pub mod core;
pub mod handler;
pub mod layer;
pub mod notification;

// Re-export the public surface for convenience
pub use appearance::{Color, ColorScheme, Icon};
pub use self::core::{merge_metadata, LogLevel, Metadata, MetadataValue};
pub use handler::{DeliveryObserver, HandlerConfig, SharedControls, SlackLogHandler};
pub use layer::SlackLayer;
pub use notification::{Attachment, Field, SlackClient, SlackError, SlackMessage, SlackTransport};
