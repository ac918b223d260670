use std::time::Duration;

use llf_client::{DrainOptions, RunOptions};

use crate::cli::{KillArgs, RunArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::{render_json, render_outcome, render_started};

fn drain_options(args: &RunArgs) -> DrainOptions {
    DrainOptions {
        output_file: args.output_file.clone(),
        echo: !args.quiet,
        settle_delay: None,
    }
}

fn validate_command(command: &str) -> CliResult<&str> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation("command must not be empty"));
    }
    Ok(trimmed)
}

pub(crate) async fn handle_run(ctx: &AppContext, args: RunArgs) -> CliResult<()> {
    let command = validate_command(&args.command)?;
    let options = RunOptions {
        process_id: args.process_id.clone(),
        submit_timeout: Some(Duration::from_secs(args.submit_timeout)),
        drain: drain_options(&args),
    };
    let outcome = ctx.client.run(command, &options).await?;
    render_outcome(&outcome);
    Ok(())
}

pub(crate) async fn handle_start(ctx: &AppContext, args: RunArgs) -> CliResult<()> {
    let command = validate_command(&args.command)?;
    let background = ctx
        .client
        .run_bg(
            command,
            args.process_id.as_deref(),
            Some(Duration::from_secs(args.submit_timeout)),
        )
        .await?;
    render_started(&background);

    let process_id = ctx
        .client
        .watch(background.stream, &drain_options(&args))
        .await?;
    tracing::debug!(process_id = %process_id, "background command finished");
    Ok(())
}

pub(crate) async fn handle_kill(ctx: &AppContext, args: KillArgs) -> CliResult<()> {
    let pid = args.pid.trim();
    if pid.is_empty() {
        return Err(CliError::validation("pid must not be empty"));
    }
    let result = ctx.client.kill_process(pid).await?;
    render_json(&result)
}
