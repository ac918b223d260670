//! Request bodies and caller-facing value types.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::sink::DrainOptions;
use crate::stream::CommandStream;

/// Response header carrying the server-assigned correlation id.
pub const HEADER_PROCESS_ID: &str = "x-process-id";
/// Response header carrying the remote OS process id.
pub const HEADER_PID: &str = "x-pid";

/// Serialization syntax the server applies when writing a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// Written through `/update_yaml`.
    Yaml,
    /// Written through `/update_json`.
    Json,
}

impl ConfigFormat {
    pub(crate) const fn endpoint(self) -> &'static str {
        match self {
            Self::Yaml => "update_yaml",
            Self::Json => "update_json",
        }
    }
}

/// Update for one configuration document on the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigUpdate {
    /// Document to read.
    pub file_path: String,
    /// New key/value tree.
    pub config: Value,
    /// Where to write the result; `None` overwrites `file_path`.
    pub modified_file_path: Option<String>,
}

impl ConfigUpdate {
    /// Update `file_path` in place.
    #[must_use]
    pub fn new(file_path: impl Into<String>, config: Value) -> Self {
        Self {
            file_path: file_path.into(),
            config,
            modified_file_path: None,
        }
    }

    /// Write the result to `destination` instead of the source path.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.modified_file_path = Some(destination.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RunCommandRequest<'a> {
    pub(crate) command: &'a str,
    pub(crate) process_id: &'a str,
}

/// Settings for one synchronous [`crate::RemoteServiceClient::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Correlation id to submit; a fresh `client_<uuid>` is generated when absent.
    pub process_id: Option<String>,
    /// Submission bound; `None` uses the client default.
    pub submit_timeout: Option<Duration>,
    /// Output sinks and settle delay.
    pub drain: DrainOptions,
}

impl RunOptions {
    /// Submit under a caller-chosen correlation id.
    #[must_use]
    pub fn with_process_id(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    /// Override the submission bound.
    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }

    /// Replace the output settings.
    #[must_use]
    pub fn with_drain(mut self, drain: DrainOptions) -> Self {
        self.drain = drain;
        self
    }
}

/// Result of a synchronous [`crate::RemoteServiceClient::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Server-assigned correlation id.
    pub process_id: String,
    /// Remote OS pid, empty when the server did not report one.
    pub pid: String,
}

/// A command started with [`crate::RemoteServiceClient::run_bg`].
#[derive(Debug)]
pub struct BackgroundCommand {
    /// Server-assigned correlation id.
    pub process_id: String,
    /// Remote OS pid, usable with `kill_process` right away.
    pub pid: String,
    /// Live output, to be handed to `watch`.
    pub stream: CommandStream,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_update_serializes_null_destination() -> Result<(), serde_json::Error> {
        let update = ConfigUpdate::new("configs/model.yaml", json!({"batch_size": 32}));
        assert_eq!(
            serde_json::to_value(&update)?,
            json!({
                "file_path": "configs/model.yaml",
                "config": {"batch_size": 32},
                "modified_file_path": null
            })
        );

        let moved = update.with_destination("configs/model.out.yaml");
        assert_eq!(
            serde_json::to_value(&moved)?["modified_file_path"],
            json!("configs/model.out.yaml")
        );
        Ok(())
    }

    #[test]
    fn format_selects_endpoint() {
        assert_eq!(ConfigFormat::Yaml.endpoint(), "update_yaml");
        assert_eq!(ConfigFormat::Json.endpoint(), "update_json");
    }
}
