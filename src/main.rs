//! slacklog - send a log message to a Slack incoming webhook.
//!
//! Builds a handler from the layered configuration, forwards one message and
//! waits for the delivery outcome before exiting.

use anyhow::{bail, Context, Result};
use clap::Parser;
use slacklog::{cli::Cli, config::Config};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let controls = Arc::new(config.slack.shared_controls());
    let handler = config.slack.build_handler(controls.clone())?;

    info!(
        label = handler.label(),
        level = %cli.level,
        global_level = %controls.global_threshold(),
        "Sending message to Slack."
    );

    if !handler.should_forward(cli.level) {
        warn!(
            "Level '{}' is below the configured threshold; nothing was sent.",
            cli.level
        );
        return Ok(());
    }

    let (outcome_tx, outcome_rx) = oneshot::channel();
    let outcome_tx = Mutex::new(Some(outcome_tx));
    controls.set_observer(move |result| {
        let sender = outcome_tx.lock().ok().and_then(|mut tx| tx.take());
        if let Some(sender) = sender {
            let _ = sender.send(result.as_ref().map(|_| ()).map_err(|e| e.to_string()));
        }
    });

    handler.handle(cli.level, &cli.message, Some(&cli.call_metadata()));

    match outcome_rx.await {
        Ok(Ok(())) => {
            info!("Message delivered.");
            Ok(())
        }
        Ok(Err(e)) => bail!("failed to deliver message: {}", e),
        Err(_) => bail!("delivery outcome was never reported"),
    }
}
