//! Configuration management for slacklog
//!
//! This module defines the main `Config` struct and the Slack handler
//! settings. It uses the `figment` crate to layer defaults, an optional TOML
//! file, environment variables and command-line arguments.

use crate::appearance::{ColorScheme, Icon};
use crate::cli::Cli;
use crate::core::{LogLevel, Metadata};
use crate::handler::{HandlerConfig, SharedControls, SlackLogHandler};
use crate::notification::SlackClient;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for slacklog's own diagnostics.
    pub log_level: String,
    /// Configuration for the Slack handler.
    pub slack: SlackConfig,
}

/// Configuration for the Slack handler.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SlackConfig {
    /// The Slack incoming webhook URL.
    pub webhook_url: Option<String>,
    /// Label shown in every attachment title.
    pub label: String,
    pub channel: Option<String>,
    pub username: Option<String>,
    /// Emoji code to use as the sender icon. Exclusive with `icon_url`.
    pub icon_emoji: Option<String>,
    /// Image URL to use as the sender icon. Exclusive with `icon_emoji`.
    pub icon_url: Option<String>,
    /// The handler's own threshold.
    pub level: LogLevel,
    /// The process-wide threshold shared by all handlers.
    pub global_level: LogLevel,
    /// Apply `level` in addition to `global_level`.
    pub enforce_instance_level: bool,
    /// Request timeout for a single webhook call.
    pub timeout_seconds: u64,
    /// Replaces the default color scheme when set.
    pub colors: Option<ColorScheme>,
    /// Static metadata attached to every notification.
    pub metadata: Metadata,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no Slack webhook URL configured")]
    MissingWebhookUrl,

    #[error("invalid {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("icon_emoji and icon_url are mutually exclusive")]
    ConflictingIcons,

    #[error("timeout_seconds must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    /// The layered configuration sources, lowest priority first.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            // e.g. SLACKLOG_SLACK__CHANNEL=ops
            .merge(Env::prefixed("SLACKLOG_").split("__"))
            .merge(
                Env::raw()
                    .only(&["WEBHOOK_URL"])
                    .map(|_| "slack.webhook_url".into()),
            )
    }

    /// Loads the configuration, with command-line arguments taking precedence.
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::figment(cli.config.as_deref())
            .merge(cli.clone())
            .extract()
            .context("failed to load configuration")
    }
}

impl SlackConfig {
    /// Validates the settings and converts them into a handler configuration.
    pub fn handler_config(&self) -> Result<HandlerConfig, ConfigError> {
        let webhook_url = self
            .webhook_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingWebhookUrl)?;
        let webhook_url = parse_url("webhook_url", webhook_url)?;

        if self.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let icon = match (&self.icon_emoji, &self.icon_url) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingIcons),
            (Some(emoji), None) => Some(Icon::Emoji(emoji.clone())),
            (None, Some(url)) => Some(Icon::Url(parse_url("icon_url", url)?)),
            (None, None) => None,
        };

        Ok(HandlerConfig {
            label: self.label.clone(),
            webhook_url,
            channel: self.channel.clone(),
            username: self.username.clone(),
            icon,
            color_scheme: self.colors.clone().unwrap_or_default(),
            level: self.level,
            enforce_instance_level: self.enforce_instance_level,
        })
    }

    pub fn shared_controls(&self) -> SharedControls {
        SharedControls::with_threshold(self.global_level)
    }

    /// Builds a handler that delivers through the HTTP client.
    pub fn build_handler(&self, controls: Arc<SharedControls>) -> Result<SlackLogHandler> {
        let config = self.handler_config()?;
        let client = SlackClient::with_timeout(Duration::from_secs(self.timeout_seconds))
            .context("failed to build HTTP client")?;
        Ok(SlackLogHandler::new(config, controls, Arc::new(client))
            .with_metadata(self.metadata.clone()))
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            slack: SlackConfig::default(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            label: "slacklog".to_string(),
            channel: None,
            username: None,
            icon_emoji: None,
            icon_url: None,
            level: LogLevel::Info,
            global_level: LogLevel::Error,
            enforce_instance_level: false,
            timeout_seconds: 10,
            colors: None,
            metadata: Metadata::new(),
        }
    }
}
