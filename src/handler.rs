//! The log handler that turns log events into Slack notifications.
//!
//! A [`SlackLogHandler`] filters each event by severity, merges its own
//! metadata with the call site's, builds a [`SlackMessage`] and hands it to a
//! [`SlackTransport`] on a detached task. Delivery outcomes never reach the
//! call site; they are logged and passed to the observer registered on the
//! handler's [`SharedControls`].

use crate::appearance::{ColorScheme, Icon};
use crate::core::{merge_metadata, LogLevel, Metadata, MetadataValue};
use crate::notification::{Attachment, Field, SlackError, SlackMessage, SlackTransport};
use arc_swap::ArcSwapOption;
use itertools::Itertools;
use reqwest::Url;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::error;

tokio::task_local! {
    pub(crate) static DELIVERING: ();
}

/// Whether the current task is delivering a notification. Events logged
/// while this holds come from the delivery itself and must not be forwarded.
pub(crate) fn in_delivery() -> bool {
    DELIVERING.try_with(|_| ()).is_ok()
}

/// Callback invoked once per dispatched notification with its outcome.
pub type DeliveryObserver = Box<dyn Fn(&Result<(), SlackError>) + Send + Sync>;

/// Settings shared by every handler in the process.
///
/// Holds the global severity gate (default: error) and the delivery observer.
/// Both are meant to be set once at startup; changing them while events are
/// in flight is allowed but unordered with respect to those events.
pub struct SharedControls {
    global_threshold: AtomicU8,
    observer: ArcSwapOption<DeliveryObserver>,
}

impl SharedControls {
    /// Controls with the default global threshold (error) and no observer.
    pub fn new() -> Self {
        Self::with_threshold(LogLevel::Error)
    }

    /// Controls starting at `level` instead of the default threshold.
    pub fn with_threshold(level: LogLevel) -> Self {
        Self {
            global_threshold: AtomicU8::new(level as u8),
            observer: ArcSwapOption::empty(),
        }
    }

    /// Events below this level are dropped by every handler.
    pub fn global_threshold(&self) -> LogLevel {
        LogLevel::from_u8(self.global_threshold.load(Ordering::Relaxed))
    }

    /// Changes the threshold for every handler sharing these controls.
    pub fn set_global_threshold(&self, level: LogLevel) {
        self.global_threshold.store(level as u8, Ordering::Relaxed);
    }

    /// Registers the callback that receives every delivery outcome,
    /// replacing any previous one.
    pub fn set_observer<F>(&self, observer: F)
    where
        F: Fn(&Result<(), SlackError>) + Send + Sync + 'static,
    {
        let observer: DeliveryObserver = Box::new(observer);
        self.observer.store(Some(Arc::new(observer)));
    }

    /// Removes the observer; outcomes are then only logged.
    pub fn clear_observer(&self) {
        self.observer.store(None);
    }

    fn notify(&self, result: &Result<(), SlackError>) {
        if let Some(observer) = self.observer.load_full() {
            (**observer)(result);
        }
    }
}

impl Default for SharedControls {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedControls")
            .field("global_threshold", &self.global_threshold())
            .field("observer", &self.observer.load().is_some())
            .finish()
    }
}

/// Per-handler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// Identifies the log source; shown in the attachment title.
    pub label: String,
    pub webhook_url: Url,
    /// Overrides the integration's default channel.
    pub channel: Option<String>,
    /// Overrides the integration's default username.
    pub username: Option<String>,
    /// Overrides the integration's default icon.
    pub icon: Option<Icon>,
    pub color_scheme: ColorScheme,
    /// The handler's own threshold. Only enforced when `enforce_instance_level` is set.
    pub level: LogLevel,
    pub enforce_instance_level: bool,
}

impl HandlerConfig {
    /// A configuration with no overrides, the default color scheme and an
    /// `info` instance level.
    pub fn new(label: impl Into<String>, webhook_url: Url) -> Self {
        Self {
            label: label.into(),
            webhook_url,
            channel: None,
            username: None,
            icon: None,
            color_scheme: ColorScheme::default(),
            level: LogLevel::Info,
            enforce_instance_level: false,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.color_scheme = color_scheme;
        self
    }
}

/// Forwards log events to a Slack webhook.
#[derive(Clone)]
pub struct SlackLogHandler {
    config: HandlerConfig,
    metadata: Metadata,
    controls: Arc<SharedControls>,
    transport: Arc<dyn SlackTransport>,
    runtime: Option<Handle>,
}

impl SlackLogHandler {
    /// Creates a handler. Dispatch runs on the ambient tokio runtime unless
    /// one is pinned with [`SlackLogHandler::with_runtime`].
    pub fn new(
        config: HandlerConfig,
        controls: Arc<SharedControls>,
        transport: Arc<dyn SlackTransport>,
    ) -> Self {
        Self {
            config,
            metadata: Metadata::new(),
            controls,
            transport,
            runtime: None,
        }
    }

    /// Pins dispatch to a runtime so events logged from plain threads can be sent.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replaces the instance metadata attached to every notification.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn controls(&self) -> &Arc<SharedControls> {
        &self.controls
    }

    /// The instance threshold; see [`HandlerConfig::enforce_instance_level`].
    pub fn level(&self) -> LogLevel {
        self.config.level
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.config.level = level;
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Adds or replaces one instance metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<MetadataValue> {
        self.metadata.remove(key)
    }

    /// Whether an event at `level` passes the gates.
    pub fn should_forward(&self, level: LogLevel) -> bool {
        if level < self.controls.global_threshold() {
            return false;
        }
        !(self.config.enforce_instance_level && level < self.config.level)
    }

    /// Handles one log event. Never fails and never blocks.
    pub fn handle(&self, level: LogLevel, message: impl fmt::Display, metadata: Option<&Metadata>) {
        if !self.should_forward(level) {
            metrics::counter!("slack_notifications_filtered").increment(1);
            return;
        }

        let metadata = merge_metadata(&self.metadata, metadata);
        let slack_message = self.make_message(level, &message.to_string(), &metadata);
        self.dispatch(slack_message);
    }

    /// Builds the webhook payload for an event with already-merged metadata.
    pub fn make_message(&self, level: LogLevel, message: &str, metadata: &Metadata) -> SlackMessage {
        let fields: Vec<Field> = metadata
            .iter()
            .map(|(key, value)| Field::new(key.as_str(), value.to_string()))
            .sorted_by(|a, b| a.title.cmp(&b.title))
            .collect();

        let attachment = Attachment {
            color: self
                .config
                .color_scheme
                .get(level)
                .map(|color| color.hex().to_string()),
            title: format!("[{}] [{}]", self.config.label, level),
            text: message.to_string(),
            fields,
        };

        let icon = self.config.icon.as_ref();
        SlackMessage {
            channel: self.config.channel.clone(),
            username: self.config.username.clone(),
            text: None,
            icon_emoji: icon.and_then(Icon::emoji).map(str::to_string),
            icon_url: icon.and_then(Icon::url).map(Url::to_string),
            attachments: vec![attachment],
        }
    }

    fn dispatch(&self, message: SlackMessage) {
        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                report(&self.controls, &self.config.label, Err(SlackError::NoRuntime));
                return;
            }
        };

        let transport = self.transport.clone();
        let controls = self.controls.clone();
        let webhook_url = self.config.webhook_url.clone();
        let label = self.config.label.clone();
        runtime.spawn(DELIVERING.scope((), async move {
            let result = transport.deliver(&message, &webhook_url).await;
            report(&controls, &label, result);
        }));
    }
}

fn report(controls: &SharedControls, label: &str, result: Result<(), SlackError>) {
    match &result {
        Ok(()) => metrics::counter!("slack_notifications_sent").increment(1),
        Err(e) => {
            metrics::counter!("slack_notifications_failed").increment(1);
            error!(label, error = %e, "Failed to send Slack message.");
        }
    }
    controls.notify(&result);
}

impl fmt::Debug for SlackLogHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackLogHandler")
            .field("config", &self.config)
            .field("metadata", &self.metadata)
            .field("controls", &self.controls)
            .finish_non_exhaustive()
    }
}
