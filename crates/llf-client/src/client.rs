//! HTTP client for the remote process-management service.
//!
//! Every method maps to exactly one endpoint. JSON responses are returned as
//! decoded [`Value`]s without reshaping; non-success statuses surface as
//! [`ClientError::Remote`]. Nothing is retried.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    BackgroundCommand, CommandOutcome, ConfigFormat, ConfigUpdate, HEADER_PID, HEADER_PROCESS_ID,
    RunCommandRequest, RunOptions,
};
use crate::sink::DrainOptions;
use crate::stream::CommandStream;

/// Client bound to one server instance.
///
/// Cheap to clone; clones share the connection pool. State is immutable after
/// construction, so a client can be used from several tasks at once as long as
/// each [`CommandStream`] is drained by a single task.
#[derive(Debug, Clone)]
pub struct RemoteServiceClient {
    http: Client,
    base: Url,
    config: ClientConfig,
}

struct Submission {
    pid: Option<String>,
    stream: CommandStream,
}

impl RemoteServiceClient {
    /// Client for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Client built from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] or [`ClientError::InvalidPath`]
    /// for unusable base URLs, and [`ClientError::Transport`] when the HTTP
    /// client cannot be built.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let base = parse_base_url(&config.base_url)?;
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|source| ClientError::transport("build http client", base.as_str(), source))?;
        Ok(Self { http, base, config })
    }

    /// Normalized base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Settings the client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /status`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses, and non-JSON bodies.
    pub async fn server_status(&self) -> ClientResult<Value> {
        let url = self.endpoint(["status"])?;
        let builder = self.http.get(url.clone());
        self.execute_json("server status", builder, &url, self.config.request_timeout)
            .await
    }

    /// `POST /cleanup`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses, and non-JSON bodies.
    pub async fn manual_cleanup(&self) -> ClientResult<Value> {
        let url = self.endpoint(["cleanup"])?;
        let builder = self.http.post(url.clone());
        self.execute_json("manual cleanup", builder, &url, self.config.request_timeout)
            .await
    }

    /// `GET /processes`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses, and non-JSON bodies.
    pub async fn list_processes(&self) -> ClientResult<Value> {
        let url = self.endpoint(["processes"])?;
        let builder = self.http.get(url.clone());
        self.execute_json("list processes", builder, &url, self.config.request_timeout)
            .await
    }

    /// `GET /config/{path}`. Leading separators are stripped and each segment
    /// is percent-escaped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPath`] without contacting the server when
    /// `path` contains a `.` or `..` segment. Otherwise fails on transport
    /// errors, non-success statuses, and non-JSON bodies.
    pub async fn get_config(&self, path: &str) -> ClientResult<Value> {
        let tail = path.trim_start_matches('/');
        // URL path handling would resolve dot segments into another document.
        if tail.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(ClientError::InvalidPath {
                value: path.to_string(),
            });
        }
        let url = self.endpoint(std::iter::once("config").chain(tail.split('/')))?;
        let builder = self.http.get(url.clone());
        self.execute_json("get config", builder, &url, self.config.request_timeout)
            .await
    }

    /// `POST /update_yaml` or `POST /update_json`, depending on `format`.
    ///
    /// The document travels as JSON either way; the server picks the syntax
    /// it writes.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses, and non-JSON bodies.
    pub async fn update_config(
        &self,
        update: &ConfigUpdate,
        format: ConfigFormat,
    ) -> ClientResult<Value> {
        let url = self.endpoint([format.endpoint()])?;
        let builder = self.http.post(url.clone()).json(update);
        self.execute_json("update config", builder, &url, self.config.request_timeout)
            .await
    }

    /// Update a YAML document, optionally writing it to `destination`.
    ///
    /// # Errors
    ///
    /// See [`Self::update_config`].
    pub async fn update_yaml_config(
        &self,
        file_path: &str,
        config: Value,
        destination: Option<&str>,
    ) -> ClientResult<Value> {
        let update = ConfigUpdate {
            file_path: file_path.to_string(),
            config,
            modified_file_path: destination.map(str::to_string),
        };
        self.update_config(&update, ConfigFormat::Yaml).await
    }

    /// Update a JSON document, optionally writing it to `destination`.
    ///
    /// # Errors
    ///
    /// See [`Self::update_config`].
    pub async fn update_json_config(
        &self,
        file_path: &str,
        config: Value,
        destination: Option<&str>,
    ) -> ClientResult<Value> {
        let update = ConfigUpdate {
            file_path: file_path.to_string(),
            config,
            modified_file_path: destination.map(str::to_string),
        };
        self.update_config(&update, ConfigFormat::Json).await
    }

    /// `POST /upload_data?save_path=...` with the file as multipart part
    /// `file`.
    ///
    /// A `save_path` ending in `/` names a directory and the server keeps the
    /// original file name; otherwise it is the exact destination.
    ///
    /// `timeout` bounds the whole request; `None` uses
    /// [`ClientConfig::upload_timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LocalFileNotFound`] before any network I/O when
    /// `local_path` is not a regular file. Otherwise fails on IO errors,
    /// transport errors, non-success statuses, and non-JSON bodies.
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        save_path: &str,
        timeout: Option<Duration>,
    ) -> ClientResult<Value> {
        let local_path = local_path.as_ref();
        let is_file = tokio::fs::metadata(local_path)
            .await
            .is_ok_and(|metadata| metadata.is_file());
        if !is_file {
            return Err(ClientError::LocalFileNotFound {
                path: local_path.to_path_buf(),
            });
        }

        let file_name = local_path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        let file = tokio::fs::File::open(local_path).await.map_err(|source| {
            ClientError::io("open upload source", Some(local_path.to_path_buf()), source)
        })?;
        let length = file
            .metadata()
            .await
            .map_err(|source| {
                ClientError::io("stat upload source", Some(local_path.to_path_buf()), source)
            })?
            .len();

        let mut url = self.endpoint(["upload_data"])?;
        url.query_pairs_mut().append_pair("save_path", save_path);

        // The file handle moves into the body and is dropped with the request.
        let part = Part::stream_with_length(file, length).file_name(file_name);
        let builder = self
            .http
            .post(url.clone())
            .multipart(Form::new().part("file", part));
        let timeout = timeout.unwrap_or(self.config.upload_timeout);
        self.execute_json("upload file", builder, &url, Some(timeout))
            .await
    }

    /// Run `command` remotely and drain its output until the server closes
    /// the stream, then wait the settle delay.
    ///
    /// A missing `X-PID` header is tolerated and reported as an empty pid.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCorrelationId`] when the server omits
    /// `X-Process-ID`, plus the usual transport, status, and sink errors.
    /// Output written before a failure stays written.
    pub async fn run(&self, command: &str, options: &RunOptions) -> ClientResult<CommandOutcome> {
        let submission = self
            .submit(
                "run command",
                command,
                options.process_id.as_deref(),
                options.submit_timeout,
            )
            .await?;
        let pid = submission.pid.unwrap_or_default();
        let process_id = submission
            .stream
            .drain(&options.drain, self.config.settle_delay)
            .await?;
        Ok(CommandOutcome { process_id, pid })
    }

    /// Submit `command` and return as soon as the response headers arrive.
    /// The output stays unread in the returned handle until [`Self::watch`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCorrelationId`] or
    /// [`ClientError::MissingPid`] when either correlation header is absent,
    /// plus the usual transport and status errors.
    pub async fn run_bg(
        &self,
        command: &str,
        process_id: Option<&str>,
        submit_timeout: Option<Duration>,
    ) -> ClientResult<BackgroundCommand> {
        let Submission { pid, stream } = self
            .submit("run command in background", command, process_id, submit_timeout)
            .await?;
        let Some(pid) = pid else {
            return Err(ClientError::MissingPid {
                process_id: stream.process_id().to_string(),
            });
        };
        Ok(BackgroundCommand {
            process_id: stream.process_id().to_string(),
            pid,
            stream,
        })
    }

    /// Drain a stream obtained from [`Self::run_bg`], exactly like
    /// [`Self::run`] does, and return its process id.
    ///
    /// # Errors
    ///
    /// Fails on transport errors while reading and on sink errors.
    pub async fn watch(&self, stream: CommandStream, options: &DrainOptions) -> ClientResult<String> {
        stream.drain(options, self.config.settle_delay).await
    }

    /// `DELETE /process/{pid}`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses, and non-JSON bodies.
    pub async fn kill_process(&self, pid: &str) -> ClientResult<Value> {
        let url = self.endpoint(["process", pid])?;
        let builder = self.http.delete(url.clone());
        self.execute_json("kill process", builder, &url, self.config.request_timeout)
            .await
    }

    async fn submit(
        &self,
        operation: &'static str,
        command: &str,
        process_id: Option<&str>,
        submit_timeout: Option<Duration>,
    ) -> ClientResult<Submission> {
        let url = self.endpoint(["run_command"])?;
        let correlation = process_id.map_or_else(generate_process_id, str::to_string);
        let body = RunCommandRequest {
            command,
            process_id: &correlation,
        };
        let bound = submit_timeout.unwrap_or(self.config.submit_timeout);

        // Only connecting and the response headers are bounded; the body may
        // stream for as long as the command runs.
        let pending = self.http.post(url.clone()).json(&body).send();
        let response = tokio::time::timeout(bound, pending)
            .await
            .map_err(|_| ClientError::SubmitTimeout {
                operation,
                url: url.to_string(),
                timeout: bound,
            })?
            .map_err(|source| ClientError::transport(operation, url.as_str(), source))?;
        tracing::debug!(
            operation,
            command,
            status = response.status().as_u16(),
            "command submitted"
        );
        let response = ensure_success(operation, url.as_str(), response).await?;

        let process_id = header_text(&response, HEADER_PROCESS_ID)
            .ok_or(ClientError::MissingCorrelationId { operation })?;
        let pid = header_text(&response, HEADER_PID);
        if process_id != correlation {
            tracing::debug!(
                submitted = %correlation,
                assigned = %process_id,
                "server reassigned process id"
            );
        }
        tracing::info!(process_id = %process_id, pid = ?pid, "command accepted");

        Ok(Submission {
            pid,
            stream: CommandStream::new(process_id, url.to_string(), response),
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidPath {
                value: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute_json(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
        url: &Url,
        timeout: Option<Duration>,
    ) -> ClientResult<Value> {
        let builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        tracing::debug!(operation, url = %url, "sending request");

        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::transport(operation, url.as_str(), source))?;
        let response = ensure_success(operation, url.as_str(), response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::transport(operation, url.as_str(), source))?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::decode(operation, source))
    }
}

fn parse_base_url(input: &str) -> ClientResult<Url> {
    let trimmed = input.trim().trim_end_matches('/');
    let base = trimmed
        .parse::<Url>()
        .map_err(|source| ClientError::InvalidBaseUrl {
            value: input.to_string(),
            source,
        })?;
    if base.cannot_be_a_base() {
        return Err(ClientError::InvalidPath {
            value: input.to_string(),
        });
    }
    Ok(base)
}

fn generate_process_id() -> String {
    format!("client_{}", Uuid::new_v4().simple())
}

fn header_text(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Pass successful responses through; turn anything else into
/// [`ClientError::Remote`] carrying the status and raw body.
async fn ensure_success(
    operation: &'static str,
    url: &str,
    response: Response,
) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let bytes = response.bytes().await.unwrap_or_else(|err| {
        tracing::debug!(operation, url, error = %err, "failed to read error body");
        Default::default()
    });
    let body = String::from_utf8_lossy(&bytes).into_owned();
    tracing::debug!(operation, url, status = status.as_u16(), "remote service rejected request");
    Err(ClientError::Remote {
        operation,
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}
