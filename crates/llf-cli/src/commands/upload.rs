use std::time::Duration;

use crate::cli::UploadArgs;
use crate::context::{AppContext, CliResult};
use crate::output::render_json;

pub(crate) async fn handle_upload(ctx: &AppContext, args: UploadArgs) -> CliResult<()> {
    let receipt = ctx
        .client
        .upload_file(
            &args.local,
            &args.save_path,
            args.upload_timeout.map(Duration::from_secs),
        )
        .await?;
    render_json(&receipt)
}
