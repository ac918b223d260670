//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use llf_client::ConfigFormat;
use llf_client::config::DEFAULT_BASE_URL;
use llf_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};

use crate::commands::config::{handle_config_get, handle_config_set};
use crate::commands::process::{handle_kill, handle_run, handle_start};
use crate::commands::status::{handle_cleanup, handle_processes, handle_status};
use crate::commands::upload::handle_upload;
use crate::context::{AppContext, CliResult};

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SETTLE_MS: u64 = 1_000;

/// Parses CLI arguments, executes the requested command, and reports
/// failures on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
    };
    if let Err(err) = llf_telemetry::init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let result = match AppContext::from_cli(&cli) {
        Ok(ctx) => dispatch(&ctx, cli.command).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            let exit_code = err.exit_code();
            tracing::debug!(exit_code, "command failed");
            eprintln!("error: {}", err.display_message());
            exit_code
        }
    }
}

async fn dispatch(ctx: &AppContext, command: Command) -> CliResult<()> {
    match command {
        Command::Status => handle_status(ctx).await,
        Command::Cleanup => handle_cleanup(ctx).await,
        Command::Ps => handle_processes(ctx).await,
        Command::Config(config) => match config {
            ConfigCommand::Get(args) => handle_config_get(ctx, args).await,
            ConfigCommand::Set(args) => handle_config_set(ctx, args).await,
        },
        Command::Upload(args) => handle_upload(ctx, args).await,
        Command::Run(args) => handle_run(ctx, args).await,
        Command::Start(args) => handle_start(ctx, args).await,
        Command::Kill(args) => handle_kill(ctx, args).await,
    }
}

#[derive(Parser)]
#[command(
    name = "llf",
    about = "Command-line client for the remote process-management service"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "LLF_API_URL",
        default_value = DEFAULT_BASE_URL
    )]
    pub(crate) api_url: String,
    #[arg(
        long,
        global = true,
        env = "LLF_HTTP_TIMEOUT_SECS",
        help = "Bound for JSON requests in seconds (unbounded when unset)"
    )]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        env = "LLF_CONNECT_TIMEOUT_SECS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
    )]
    pub(crate) connect_timeout: u64,
    #[arg(
        long,
        global = true,
        env = "LLF_SETTLE_MS",
        default_value_t = DEFAULT_SETTLE_MS,
        help = "Milliseconds to wait after a command's output stream ends"
    )]
    pub(crate) settle_ms: u64,
    #[arg(long, global = true, env = "LLF_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "LLF_LOG_FORMAT",
        value_parser = parse_log_format,
        help = "Log format: pretty or json (defaults by build profile)"
    )]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(about = "Show server status")]
    Status,
    #[command(about = "Ask the server to clean up finished processes")]
    Cleanup,
    #[command(about = "List processes tracked by the server")]
    Ps,
    #[command(subcommand, about = "Read or update configuration documents")]
    Config(ConfigCommand),
    #[command(about = "Upload a local file")]
    Upload(UploadArgs),
    #[command(about = "Run a command and stream its output until it finishes")]
    Run(RunArgs),
    #[command(about = "Start a command in the background, report its ids, then stream it")]
    Start(RunArgs),
    #[command(about = "Terminate a remote process")]
    Kill(KillArgs),
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    Get(ConfigGetArgs),
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub(crate) struct ConfigGetArgs {
    #[arg(help = "Configuration path on the server")]
    pub(crate) path: String,
}

#[derive(Args)]
pub(crate) struct ConfigSetArgs {
    #[arg(help = "Configuration path on the server")]
    pub(crate) path: String,
    #[arg(short = 'f', long = "file", help = "Local JSON document with the new values")]
    pub(crate) file: PathBuf,
    #[arg(long, help = "Write the result here instead of overwriting PATH")]
    pub(crate) dest: Option<String>,
    #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
    pub(crate) format: DocumentFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl From<DocumentFormat> for ConfigFormat {
    fn from(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Yaml => Self::Yaml,
            DocumentFormat::Json => Self::Json,
        }
    }
}

#[derive(Args)]
pub(crate) struct UploadArgs {
    #[arg(help = "Local file to upload")]
    pub(crate) local: PathBuf,
    #[arg(help = "Target path; a trailing '/' keeps the original file name")]
    pub(crate) save_path: String,
    #[arg(
        long,
        env = "LLF_UPLOAD_TIMEOUT_SECS",
        help = "Bound for the upload in seconds (defaults to 30)"
    )]
    pub(crate) upload_timeout: Option<u64>,
}

#[derive(Args)]
pub(crate) struct RunArgs {
    #[arg(help = "Shell command to execute remotely")]
    pub(crate) command: String,
    #[arg(long, help = "Append output lines to this file")]
    pub(crate) output_file: Option<PathBuf>,
    #[arg(long, help = "Do not echo output to stdout")]
    pub(crate) quiet: bool,
    #[arg(long, help = "Correlation id (defaults to a generated one)")]
    pub(crate) process_id: Option<String>,
    #[arg(long, default_value_t = DEFAULT_SUBMIT_TIMEOUT_SECS)]
    pub(crate) submit_timeout: u64,
}

#[derive(Args)]
pub(crate) struct KillArgs {
    #[arg(help = "Remote process id")]
    pub(crate) pid: String,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse::<LogFormat>().map_err(|err| format!("{err}: '{input}'"))
}
