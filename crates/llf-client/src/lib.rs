#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Client library for a remote process-management and file/configuration
//! service.
//!
//! Layout:
//! - `client.rs`: [`RemoteServiceClient`] and the endpoint mappings
//! - `stream.rs`: live command output and the line-draining loop
//! - `sink.rs`: console/file fan-out for drained lines
//! - `models.rs`: request bodies and result types
//! - `config.rs`: client settings and defaults
//! - `error.rs`: the [`ClientError`] taxonomy
//!
//! ```no_run
//! # async fn demo() -> llf_client::ClientResult<()> {
//! use llf_client::{DrainOptions, RemoteServiceClient, RunOptions};
//!
//! let client = RemoteServiceClient::new("http://localhost:9000")?;
//! let status = client.server_status().await?;
//! println!("{status}");
//!
//! let options = RunOptions::default()
//!     .with_drain(DrainOptions::default().with_output_file("output.log"));
//! let outcome = client.run("echo 'Hello World' && sleep 2", &options).await?;
//! println!("{} (pid {})", outcome.process_id, outcome.pid);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sink;
pub mod stream;

pub use client::RemoteServiceClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use models::{
    BackgroundCommand, CommandOutcome, ConfigFormat, ConfigUpdate, HEADER_PID, HEADER_PROCESS_ID,
    RunOptions,
};
pub use sink::{DrainOptions, OutputSink};
pub use stream::CommandStream;
