//! Shared client context and error mapping for the CLI.

use std::time::Duration;

use anyhow::anyhow;
use llf_client::{ClientConfig, ClientError, RemoteServiceClient};

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<ClientError> for CliError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::LocalFileNotFound { path } => {
                Self::validation(format!("local file not found: {}", path.display()))
            }
            ClientError::Remote {
                operation,
                status: status @ (400 | 409 | 422),
                body,
                ..
            } => Self::validation(format!(
                "{operation} rejected (status {status}): {}",
                body.trim()
            )),
            ClientError::Remote {
                operation,
                url,
                status,
                body,
            } => {
                let body = body.trim();
                if body.is_empty() {
                    Self::failure(anyhow!("{operation} failed with status {status} ({url})"))
                } else {
                    Self::failure(anyhow!(
                        "{operation} failed with status {status} ({url}): {body}"
                    ))
                }
            }
            ClientError::MissingPid { process_id } => Self::failure(anyhow!(
                "server did not return a pid for process {process_id}"
            )),
            other => Self::failure(other),
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: RemoteServiceClient,
}

impl AppContext {
    /// Build the service client from global CLI options.
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let config = ClientConfig::new(cli.api_url.clone())
            .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
            .with_request_timeout(cli.timeout.map(Duration::from_secs))
            .with_settle_delay(Duration::from_millis(cli.settle_ms));
        let client = RemoteServiceClient::with_config(config).map_err(|err| match err {
            ClientError::InvalidBaseUrl { value, source } => {
                CliError::validation(format!("invalid URL '{value}': {source}"))
            }
            ClientError::InvalidPath { value } => {
                CliError::validation(format!("URL '{value}' cannot be used as a base"))
            }
            other => CliError::failure(other),
        })?;
        Ok(Self { client })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn remote(status: u16, body: &str) -> ClientError {
        ClientError::Remote {
            operation: "get config",
            url: "http://localhost:9000/config/a.yaml".to_string(),
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn client_errors_map_to_exit_codes() {
        let missing = CliError::from(ClientError::LocalFileNotFound {
            path: PathBuf::from("data.csv"),
        });
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(missing.display_message(), "local file not found: data.csv");

        let rejected = CliError::from(remote(422, "bad yaml\n"));
        assert_eq!(rejected.exit_code(), 2);
        assert_eq!(
            rejected.display_message(),
            "get config rejected (status 422): bad yaml"
        );

        let failed = CliError::from(remote(500, "boom"));
        assert_eq!(failed.exit_code(), 3);
        assert!(failed.display_message().contains("status 500"));
        assert!(failed.display_message().contains("boom"));

        let no_id = CliError::from(ClientError::MissingCorrelationId {
            operation: "run command",
        });
        assert_eq!(no_id.exit_code(), 3);
        assert_eq!(no_id.display_message(), "server did not return a process id");
    }

    #[test]
    fn context_rejects_invalid_url() {
        let cli = Cli::parse_from(["llf", "--api-url", "not a url", "status"]);
        let err = AppContext::from_cli(&cli)
            .err()
            .map(|err| err.display_message())
            .unwrap_or_default();
        assert!(err.contains("invalid URL"));
    }
}
