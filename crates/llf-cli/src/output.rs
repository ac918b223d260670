//! Output renderers for CLI commands.
//!
//! JSON results go to stdout. Command summaries go to stderr so they do not
//! interleave with streamed command output.

use anyhow::anyhow;
use llf_client::{BackgroundCommand, CommandOutcome};
use serde_json::Value;

use crate::context::{CliError, CliResult};

pub(crate) fn render_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

#[must_use]
pub(crate) fn format_pid(pid: &str) -> &str {
    if pid.is_empty() { "<unknown>" } else { pid }
}

pub(crate) fn render_started(command: &BackgroundCommand) {
    eprintln!(
        "started process_id: {} pid: {}",
        command.process_id,
        format_pid(&command.pid)
    );
}

pub(crate) fn render_outcome(outcome: &CommandOutcome) {
    eprintln!(
        "finished process_id: {} pid: {}",
        outcome.process_id,
        format_pid(&outcome.pid)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_pid_renders_placeholder() {
        assert_eq!(format_pid(""), "<unknown>");
        assert_eq!(format_pid("4242"), "4242");
    }

    #[test]
    fn render_json_accepts_any_value() {
        assert!(render_json(&json!({"status": "ok", "processes": []})).is_ok());
        assert!(render_json(&Value::Null).is_ok());
    }
}
