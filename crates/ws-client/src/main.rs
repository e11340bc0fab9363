//! WS-Client: command-line client for correlated WebSocket requests.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use ws_connection::{
    Envelope, Message, StaticTokenProvider, TungsteniteTransport, WebSocketConnection,
};
use ws_telemetry::{init_logging, TelemetryConfig};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let mut connection = WebSocketConnection::new(
        cli.connection_config(),
        Arc::new(TungsteniteTransport::new()),
    )
    .context("Invalid connection settings")?;
    if let Some(token) = &cli.token {
        connection =
            connection.with_token_provider(Arc::new(StaticTokenProvider::new(token.clone())));
    }

    connection
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", cli.uri))?;

    let result = run(&connection, cli.command).await;
    connection.dispose().await;
    result
}

async fn run(connection: &WebSocketConnection, command: Command) -> Result<()> {
    match command {
        Command::Send { kind, content } => {
            let message = outbound_message(kind, content);
            connection
                .send_message(&message)
                .await
                .context("Failed to send message")?;
        }
        Command::Request { kind, content } => {
            let response = connection
                .request(kind, content.unwrap_or_default())
                .await
                .context("Request failed")?;
            println!("{}", response.encode());
        }
        Command::Listen { count } => {
            let mut unsolicited = connection.subscribe();
            let mut received = 0usize;
            while count.map_or(true, |limit| received < limit) {
                tokio::select! {
                    message = unsolicited.recv() => match message {
                        Ok(message) => {
                            println!("{}", message.encode());
                            received += 1;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped = skipped, "Listener fell behind; messages dropped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

/// Fire-and-forget messages carry no correlation id.
fn outbound_message(kind: String, content: Option<String>) -> Message {
    Message::new(kind).with_content(content.unwrap_or_default())
}
