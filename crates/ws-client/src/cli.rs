//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::time::Duration;
use ws_connection::domain::config::DEFAULT_URI;
use ws_connection::ConnectionConfig;

/// WS-Client: send correlated requests over a WebSocket
#[derive(Parser, Debug)]
#[command(name = "ws-client")]
#[command(about = "Send messages and correlated requests to a WebSocket server")]
pub struct Cli {
    /// WebSocket server address
    #[arg(short, long, global = true, default_value = DEFAULT_URI)]
    pub uri: String,

    /// Session token sent in the Authorization header
    #[arg(long, global = true, requires = "service")]
    pub token: Option<String>,

    /// Service name the token is issued for
    #[arg(short, long, global = true)]
    pub service: Option<String>,

    /// Request timeout (e.g. 500ms, 10s)
    #[arg(short, long, global = true, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send a message without waiting for a reply
    Send {
        /// Message type
        kind: String,
        /// Message content
        content: Option<String>,
    },
    /// Send a request and print the correlated response
    Request {
        /// Request type
        kind: String,
        /// Request content
        content: Option<String>,
    },
    /// Print unsolicited messages
    Listen {
        /// Stop after this many messages
        #[arg(short, long)]
        count: Option<usize>,
    },
}

impl Cli {
    /// Connection configuration for these arguments.
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(self.uri.clone());
        if let Some(service) = &self.service {
            if self.token.is_some() {
                config = config.with_token_service(service.clone());
            }
        }
        if let Some(timeout) = self.timeout {
            config = config.with_request_timeout(timeout);
        }
        config
    }
}

fn parse_duration(value: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_with_globals() {
        let cli = Cli::try_parse_from([
            "ws-client",
            "--uri",
            "ws://example:9000",
            "--timeout",
            "250ms",
            "request",
            "ping",
            "hello",
        ])
        .unwrap();

        assert_eq!(cli.uri, "ws://example:9000");
        assert_eq!(cli.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            cli.command,
            Command::Request {
                kind: "ping".into(),
                content: Some("hello".into()),
            }
        );

        let config = cli.connection_config();
        assert_eq!(config.timeouts.request, Some(Duration::from_millis(250)));
        assert!(!config.auth.use_token);
    }

    #[test]
    fn test_token_enables_auth() {
        let cli = Cli::try_parse_from([
            "ws-client",
            "--token",
            "secret",
            "--service",
            "Hangout",
            "send",
            "push",
        ])
        .unwrap();

        let config = cli.connection_config();
        assert!(config.auth.use_token);
        assert_eq!(config.auth.service_name.as_deref(), Some("Hangout"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ws-client", "listen", "--count", "3"]).unwrap();
        assert_eq!(cli.uri, DEFAULT_URI);
        assert_eq!(cli.command, Command::Listen { count: Some(3) });
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(Cli::try_parse_from(["ws-client", "--timeout", "soon", "listen"]).is_err());
    }
}
