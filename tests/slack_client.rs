//! End-to-end tests: handler plus the real HTTP client against a mock webhook.

mod helpers;

use helpers::mock_slack::{Outcome, OutcomeRecorder};
use reqwest::Url;
use slacklog::{
    HandlerConfig, Icon, LogLevel, Metadata, SharedControls, SlackClient, SlackLogHandler,
    SlackMessage,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn handler_for(server: &MockServer, controls: Arc<SharedControls>) -> SlackLogHandler {
    let webhook_url = Url::parse(&format!("{}/services/test", server.uri())).unwrap();
    let config = HandlerConfig::new("node-1", webhook_url)
        .with_username("TestApp")
        .with_icon(Icon::Url(
            Url::parse("https://example.com/logo.png").unwrap(),
        ));
    SlackLogHandler::new(config, controls, Arc::new(SlackClient::new().unwrap()))
}

#[tokio::test]
async fn test_handler_posts_json_payload() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/test"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let controls = Arc::new(SharedControls::new());
    let recorder = OutcomeRecorder::install(&controls);
    let handler = handler_for(&server, controls);

    let mut metadata = Metadata::new();
    metadata.insert("mount".to_string(), "/var".into());

    // Act
    handler.handle(LogLevel::Critical, "disk full", Some(&metadata));
    recorder.wait_for_count(1, WAIT).await;

    // Assert
    assert_eq!(recorder.outcomes(), vec![Outcome::Delivered]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "username": "TestApp",
            "icon_url": "https://example.com/logo.png",
            "attachments": [{
                "color": "#fc4349",
                "title": "[node-1] [critical]",
                "text": "disk full",
                "fields": [{ "title": "mount", "value": "/var", "short": true }]
            }]
        })
    );
    let message: SlackMessage = serde_json::from_value(body).unwrap();
    assert_eq!(message.channel, None);
}

#[tokio::test]
async fn test_server_error_is_reported_with_body() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bad request"))
        .mount(&server)
        .await;

    let controls = Arc::new(SharedControls::new());
    let recorder = OutcomeRecorder::install(&controls);
    let handler = handler_for(&server, controls);

    // Act
    handler.handle(LogLevel::Error, "this will be rejected", None);
    recorder.wait_for_count(1, WAIT).await;

    // Assert
    assert_eq!(
        recorder.outcomes(),
        vec![Outcome::Protocol {
            status: 500,
            body: Some("bad request".to_string())
        }]
    );
}

#[tokio::test]
async fn test_filtered_event_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let handler = handler_for(&server, Arc::new(SharedControls::new()));

    handler.handle(LogLevel::Warning, "not important enough", None);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(server.received_requests().await.unwrap().is_empty());
}
