//! Live command output and the line-draining loop shared by `run` and `watch`.

use std::borrow::Cow;
use std::time::Duration;

use futures_util::{Stream, StreamExt, pin_mut};

use crate::error::{ClientError, ClientResult};
use crate::sink::{DrainOptions, OutputSink};

/// Output stream of a command started in the background.
///
/// Owns the HTTP response. It is consumed by
/// [`crate::RemoteServiceClient::watch`], so it can be drained only once.
#[derive(Debug)]
pub struct CommandStream {
    process_id: String,
    url: String,
    response: reqwest::Response,
}

impl CommandStream {
    pub(crate) const fn new(process_id: String, url: String, response: reqwest::Response) -> Self {
        Self {
            process_id,
            url,
            response,
        }
    }

    /// Correlation id of the command producing this stream.
    #[must_use]
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Drain the body into the sinks described by `options`, then wait the
    /// settle delay. Returns the process id.
    pub(crate) async fn drain(
        self,
        options: &DrainOptions,
        default_settle: Duration,
    ) -> ClientResult<String> {
        let Self {
            process_id,
            url,
            response,
        } = self;

        let mut sink = OutputSink::open(options).await?;
        let chunks = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|source| ClientError::transport("drain output", url.clone(), source))
        });
        drain_lines(chunks, &mut sink).await?;
        let lines = sink.finish().await?;
        tracing::info!(process_id = %process_id, lines, "command output drained");

        let settle = options.settle_delay.unwrap_or(default_settle);
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(process_id)
    }
}

/// Split a chunked byte stream into lines and emit every non-empty one.
///
/// Both `\n` and a bare `\r` end a line, so carriage-return progress updates
/// reach the sinks as they arrive. A `\r\n` pair yields one line because the
/// empty piece between the two bytes is skipped like any blank line. Lines may
/// straddle chunk boundaries, and an unterminated final line is emitted when
/// the stream ends.
pub(crate) async fn drain_lines<S, B>(chunks: S, sink: &mut OutputSink) -> ClientResult<()>
where
    S: Stream<Item = ClientResult<B>>,
    B: AsRef<[u8]>,
{
    pin_mut!(chunks);
    let mut pending: Vec<u8> = Vec::new();

    while let Some(chunk) = chunks.next().await {
        pending.extend_from_slice(chunk?.as_ref());
        while let Some(pos) = pending.iter().position(|byte| matches!(byte, b'\n' | b'\r')) {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            emit_raw(&line[..pos], sink).await?;
        }
    }

    if !pending.is_empty() {
        emit_raw(&pending, sink).await?;
    }
    Ok(())
}

async fn emit_raw(raw: &[u8], sink: &mut OutputSink) -> ClientResult<()> {
    if raw.is_empty() {
        return Ok(());
    }
    let text = String::from_utf8_lossy(raw);
    if matches!(text, Cow::Owned(_)) {
        tracing::warn!(bytes = raw.len(), "replaced invalid utf-8 in command output");
    }
    sink.emit_line(&text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use futures_util::stream;
    use std::io;
    use std::path::Path;

    async fn file_sink(path: &Path) -> ClientResult<OutputSink> {
        OutputSink::open(
            &DrainOptions::default()
                .with_echo(false)
                .with_output_file(path),
        )
        .await
    }

    fn chunks(parts: &[&[u8]]) -> Vec<ClientResult<Vec<u8>>> {
        parts.iter().map(|part| Ok(part.to_vec())).collect()
    }

    #[tokio::test]
    async fn keep_alive_lines_are_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.log");
        let mut sink = file_sink(&path).await?;

        drain_lines(stream::iter(chunks(&[b"a\n", b"", b"\n", b"b\n"])), &mut sink).await?;
        assert_eq!(sink.finish().await?, 2);
        assert_eq!(std::fs::read_to_string(&path)?, "a\nb\n");
        Ok(())
    }

    #[tokio::test]
    async fn lines_spanning_chunks_are_joined() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.log");
        let mut sink = file_sink(&path).await?;

        drain_lines(
            stream::iter(chunks(&[b"hel", b"lo\r\nwor", b"ld\nlast"])),
            &mut sink,
        )
        .await?;
        sink.finish().await?;
        assert_eq!(std::fs::read_to_string(&path)?, "hello\nworld\nlast\n");
        Ok(())
    }

    #[tokio::test]
    async fn carriage_returns_end_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.log");
        let mut sink = file_sink(&path).await?;

        drain_lines(
            stream::iter(chunks(&[b"10%\r20%\r30%\n", b"done\r", b"\n"])),
            &mut sink,
        )
        .await?;
        assert_eq!(sink.finish().await?, 4);
        assert_eq!(std::fs::read_to_string(&path)?, "10%\n20%\n30%\ndone\n");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.log");
        let mut sink = file_sink(&path).await?;

        // A multi-byte character split across chunks still decodes cleanly.
        drain_lines(
            stream::iter(chunks(&[b"caf\xc3", b"\xa9\n", b"bad \xff byte\n"])),
            &mut sink,
        )
        .await?;
        sink.finish().await?;
        assert_eq!(
            std::fs::read_to_string(&path)?,
            "caf\u{e9}\nbad \u{fffd} byte\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_flushed_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.log");

        let items: Vec<ClientResult<Vec<u8>>> = vec![
            Ok(b"before\n".to_vec()),
            Err(ClientError::io("read", None, io::Error::other("reset"))),
            Ok(b"after\n".to_vec()),
        ];
        let result = {
            let mut sink = file_sink(&path).await?;
            drain_lines(stream::iter(items), &mut sink).await
        };

        assert!(matches!(result, Err(ClientError::Io { .. })));
        assert_eq!(std::fs::read_to_string(&path)?, "before\n");
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
