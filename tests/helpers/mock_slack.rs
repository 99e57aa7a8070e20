//! A mock Slack transport and an outcome recorder for handler tests.

use async_trait::async_trait;
use reqwest::Url;
use slacklog::{SharedControls, SlackError, SlackMessage, SlackTransport};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// What the mock replies with.
#[derive(Clone, Debug)]
pub enum MockResponse {
    Success,
    Status(u16, Option<String>),
}

/// Records every delivered message and answers with a configurable response.
#[derive(Clone)]
pub struct MockSlackTransport {
    pub sent: Arc<Mutex<Vec<(SlackMessage, Url)>>>,
    response: Arc<Mutex<MockResponse>>,
    notifier: Arc<Notify>,
}

impl MockSlackTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(MockResponse::Success)),
            notifier: Arc::new(Notify::new()),
        }
    }

    pub fn respond_with(&self, response: MockResponse) {
        *self.response.lock().unwrap() = response;
    }

    pub fn messages(&self) -> Vec<SlackMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub async fn wait_for_count(&self, target_count: usize, timeout_duration: Duration) {
        let wait_future = async {
            while self.count() < target_count {
                self.notifier.notified().await;
            }
        };

        tokio::time::timeout(timeout_duration, wait_future)
            .await
            .expect("Timed out waiting for Slack messages");
    }
}

#[async_trait]
impl SlackTransport for MockSlackTransport {
    async fn deliver(&self, message: &SlackMessage, webhook_url: &Url) -> Result<(), SlackError> {
        self.sent
            .lock()
            .unwrap()
            .push((message.clone(), webhook_url.clone()));
        self.notifier.notify_one();

        let response = self.response.lock().unwrap().clone();
        match response {
            MockResponse::Success => Ok(()),
            MockResponse::Status(status, body) => Err(SlackError::Protocol { status, body }),
        }
    }
}

/// A delivery outcome as seen by the observer hook.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Delivered,
    Protocol { status: u16, body: Option<String> },
    Other(String),
}

/// Collects every outcome reported through a `SharedControls` observer.
#[derive(Clone)]
pub struct OutcomeRecorder {
    pub outcomes: Arc<Mutex<Vec<Outcome>>>,
    notifier: Arc<Notify>,
}

impl OutcomeRecorder {
    pub fn install(controls: &SharedControls) -> Self {
        let recorder = Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            notifier: Arc::new(Notify::new()),
        };

        let sink = recorder.clone();
        controls.set_observer(move |result| {
            let outcome = match result {
                Ok(()) => Outcome::Delivered,
                Err(SlackError::Protocol { status, body }) => Outcome::Protocol {
                    status: *status,
                    body: body.clone(),
                },
                Err(e) => Outcome::Other(e.to_string()),
            };
            sink.outcomes.lock().unwrap().push(outcome);
            sink.notifier.notify_one();
        });

        recorder
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub async fn wait_for_count(&self, target_count: usize, timeout_duration: Duration) {
        let wait_future = async {
            while self.outcomes.lock().unwrap().len() < target_count {
                self.notifier.notified().await;
            }
        };

        tokio::time::timeout(timeout_duration, wait_future)
            .await
            .expect("Timed out waiting for delivery outcomes");
    }
}
