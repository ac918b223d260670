//! Fan-out target for streamed command output.
//!
//! An [`OutputSink`] composes the console and an optional append-only log file
//! behind [`OutputSink::emit_line`]. The file handle lives inside the sink, so
//! it is released whenever the sink is dropped, whatever path the drain took.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{ClientError, ClientResult};

/// Where streamed output lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOptions {
    /// Append every line to this file, flushing after each one.
    pub output_file: Option<PathBuf>,
    /// Echo every line to stdout.
    pub echo: bool,
    /// Quiescence delay after the stream ends; `None` uses the client default.
    pub settle_delay: Option<Duration>,
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            output_file: None,
            echo: true,
            settle_delay: None,
        }
    }
}

impl DrainOptions {
    /// Append output to `path`.
    #[must_use]
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Toggle console echo.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Override the quiescence delay for this drain.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }
}

/// Console and file sinks for one drain.
#[derive(Debug)]
pub struct OutputSink {
    echo: bool,
    file: Option<(PathBuf, File)>,
    lines: u64,
}

impl OutputSink {
    /// Open the sinks requested by `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the output file cannot be opened.
    pub async fn open(options: &DrainOptions) -> ClientResult<Self> {
        let file = match &options.output_file {
            Some(path) => {
                let handle = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|source| {
                        ClientError::io("open output file", Some(path.clone()), source)
                    })?;
                Some((path.clone(), handle))
            }
            None => None,
        };
        Ok(Self {
            echo: options.echo,
            file,
            lines: 0,
        })
    }

    /// Write one line to every configured sink.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when stdout or the output file rejects the
    /// write. Lines emitted earlier stay written.
    pub async fn emit_line(&mut self, line: &str) -> ClientResult<()> {
        if self.echo {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{line}")
                .and_then(|()| stdout.flush())
                .map_err(|source| ClientError::io("echo line", None, source))?;
        }

        if let Some((path, file)) = self.file.as_mut() {
            let mut record = String::with_capacity(line.len() + 1);
            record.push_str(line);
            record.push('\n');
            file.write_all(record.as_bytes())
                .await
                .map_err(|source| ClientError::io("append line", Some(path.clone()), source))?;
            file.flush()
                .await
                .map_err(|source| ClientError::io("flush line", Some(path.clone()), source))?;
        }

        self.lines += 1;
        Ok(())
    }

    /// Flush and close the sinks, returning the number of lines emitted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the final flush fails.
    pub async fn finish(mut self) -> ClientResult<u64> {
        if let Some((path, mut file)) = self.file.take() {
            file.shutdown()
                .await
                .map_err(|source| ClientError::io("close output file", Some(path), source))?;
        }
        Ok(self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn file_sink_appends_terminated_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.log");
        std::fs::write(&path, "previous\n")?;

        let options = DrainOptions::default()
            .with_echo(false)
            .with_output_file(&path);
        let mut sink = OutputSink::open(&options).await?;
        sink.emit_line("first").await?;
        assert_eq!(std::fs::read_to_string(&path)?, "previous\nfirst\n");
        sink.emit_line("second").await?;
        assert_eq!(sink.finish().await?, 2);

        assert_eq!(std::fs::read_to_string(&path)?, "previous\nfirst\nsecond\n");
        Ok(())
    }

    #[tokio::test]
    async fn open_reports_unwritable_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = DrainOptions::default()
            .with_echo(false)
            .with_output_file(dir.path().join("missing").join("out.log"));
        let err = OutputSink::open(&options)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected open failure"))?;
        assert!(matches!(err, ClientError::Io { path: Some(_), .. }));
        Ok(())
    }

    #[test]
    fn defaults_echo_without_file() {
        let options = DrainOptions::default();
        assert!(options.echo);
        assert!(options.output_file.is_none());
        assert!(options.settle_delay.is_none());
    }
}
