//! The Slack incoming-webhook payload.

use serde::{Deserialize, Serialize};

/// Titles and values shorter than this many characters are rendered side by side.
pub const SHORT_FIELD_LIMIT: usize = 16;

/// A webhook message. The adapter always sends exactly one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Reserved; the log handler never sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub title: String,
    pub text: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl Field {
    /// Builds a field, marking it short when both title and value fit the limit.
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        let title = title.into();
        let value = value.into();
        let short = title.chars().count() < SHORT_FIELD_LIMIT
            && value.chars().count() < SHORT_FIELD_LIMIT;
        Self {
            title,
            value,
            short,
        }
    }
}
