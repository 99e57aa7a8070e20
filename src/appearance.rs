//! How a notification looks in Slack: accent colors per level and the
//! sender's icon.

use crate::core::LogLevel;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A color represented by a hex string, e.g. `#fc4349`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Wraps a hex string as-is; no validation is applied.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex string sent as the attachment color.
    pub fn hex(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Color {
    fn from(hex: &str) -> Self {
        Self::new(hex)
    }
}

impl From<String> for Color {
    fn from(hex: String) -> Self {
        Self(hex)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps log levels to attachment colors. Levels without an entry get no color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorScheme(HashMap<LogLevel, Color>);

impl ColorScheme {
    /// A scheme with no colors at all.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// The color for `level`, or `None` if the scheme has no entry for it.
    pub fn get(&self, level: LogLevel) -> Option<&Color> {
        self.0.get(&level)
    }

    /// Sets the color for `level`, returning the one it replaced.
    pub fn insert(&mut self, level: LogLevel, color: impl Into<Color>) -> Option<Color> {
        self.0.insert(level, color.into())
    }

    /// Builder form of [`ColorScheme::insert`].
    pub fn with(mut self, level: LogLevel, color: impl Into<Color>) -> Self {
        self.insert(level, color);
        self
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::empty()
            .with(LogLevel::Trace, "#18ed50")
            .with(LogLevel::Debug, "#18ed50")
            .with(LogLevel::Info, "#1f95c1")
            .with(LogLevel::Notice, "#1f95c1")
            .with(LogLevel::Warning, "#fecb57")
            .with(LogLevel::Error, "#fc4349")
            .with(LogLevel::Critical, "#fc4349")
    }
}

impl<C: Into<Color>> FromIterator<(LogLevel, C)> for ColorScheme {
    fn from_iter<I: IntoIterator<Item = (LogLevel, C)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(l, c)| (l, c.into())).collect())
    }
}

/// The icon shown next to the sender's name in place of the integration default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    /// An emoji code such as `smile` or `:rotating_light:`.
    Emoji(String),
    /// An image URL.
    Url(Url),
}

impl Icon {
    /// The emoji code, if this is an emoji icon.
    pub fn emoji(&self) -> Option<&str> {
        match self {
            Icon::Emoji(emoji) => Some(emoji),
            Icon::Url(_) => None,
        }
    }

    /// The image URL, if this is a URL icon.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Icon::Url(url) => Some(url),
            Icon::Emoji(_) => None,
        }
    }
}
