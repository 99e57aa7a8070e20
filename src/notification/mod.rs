//! The Slack side of the pipeline: the webhook payload and the transport that
//! delivers it.
pub mod message;
pub mod slack;

pub use message::{Attachment, Field, SlackMessage};
pub use slack::{SlackClient, SlackError, SlackTransport};
