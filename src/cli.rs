//! Command-Line Interface (CLI) argument parsing.
//!
//! The arguments are parsed at startup and then merged over the configuration
//! from the TOML file and environment variables.

use crate::core::{LogLevel, Metadata, MetadataValue};
use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata as ProviderMetadata, Profile, Provider,
};
use std::path::PathBuf;

/// Send a log message to a Slack incoming webhook.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The Slack incoming webhook URL.
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Label shown in the notification title.
    #[arg(long)]
    pub label: Option<String>,

    /// Override the webhook's default channel.
    #[arg(long)]
    pub channel: Option<String>,

    /// Override the webhook's default username.
    #[arg(long)]
    pub username: Option<String>,

    /// Override the process-wide threshold.
    #[arg(long, value_name = "LEVEL")]
    pub global_level: Option<LogLevel>,

    /// Severity of the message.
    #[arg(short, long, default_value = "error")]
    pub level: LogLevel,

    /// Metadata to attach, as key=value. May be repeated.
    #[arg(short = 'm', long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,

    /// The message text.
    pub message: String,
}

impl Cli {
    /// The `--meta` pairs as call-site metadata.
    pub fn call_metadata(&self) -> Metadata {
        self.metadata
            .iter()
            .map(|(k, v)| (k.clone(), MetadataValue::from(v.as_str())))
            .collect()
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Provider for Cli {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut slack = Dict::new();

        let overrides = [
            ("webhook_url", &self.webhook_url),
            ("label", &self.label),
            ("channel", &self.channel),
            ("username", &self.username),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                slack.insert(key.into(), Value::from(value.clone()));
            }
        }

        if let Some(level) = self.global_level {
            slack.insert("global_level".into(), Value::from(level.as_str()));
        }

        let mut dict = Dict::new();
        if !slack.is_empty() {
            dict.insert("slack".into(), Value::from(slack));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
