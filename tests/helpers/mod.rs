#![allow(dead_code)]
pub mod log_capture;
pub mod mock_slack;

use mock_slack::MockSlackTransport;
use reqwest::Url;
use slacklog::{HandlerConfig, Icon, SharedControls, SlackLogHandler};
use std::sync::Arc;

pub const TEST_WEBHOOK_URL: &str = "https://hooks.slack.com/services/test";

/// The configuration used by most handler tests.
pub fn test_config(label: &str) -> HandlerConfig {
    HandlerConfig::new(label, Url::parse(TEST_WEBHOOK_URL).unwrap())
        .with_channel("slacklog-test-channel")
        .with_username("TestApp")
        .with_icon(Icon::Emoji("smile".to_string()))
}

/// Creates a handler wired to a fresh mock transport and fresh shared controls.
pub fn create_test_handler(
    config: HandlerConfig,
) -> (SlackLogHandler, MockSlackTransport, Arc<SharedControls>) {
    let transport = MockSlackTransport::new();
    let controls = Arc::new(SharedControls::new());
    let handler = SlackLogHandler::new(config, controls.clone(), Arc::new(transport.clone()));
    (handler, transport, controls)
}
