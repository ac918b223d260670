use crate::context::{AppContext, CliResult};
use crate::output::render_json;

pub(crate) async fn handle_status(ctx: &AppContext) -> CliResult<()> {
    let status = ctx.client.server_status().await?;
    render_json(&status)
}

pub(crate) async fn handle_cleanup(ctx: &AppContext) -> CliResult<()> {
    let result = ctx.client.manual_cleanup().await?;
    render_json(&result)
}

pub(crate) async fn handle_processes(ctx: &AppContext) -> CliResult<()> {
    let processes = ctx.client.list_processes().await?;
    render_json(&processes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use llf_client::{ClientConfig, RemoteServiceClient};
    use serde_json::json;

    use crate::context::CliError;

    fn context_with(server: &MockServer) -> Result<AppContext> {
        Ok(AppContext {
            client: RemoteServiceClient::with_config(ClientConfig::new(server.base_url()))?,
        })
    }

    #[tokio::test]
    async fn status_fetches_server_state() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/status");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "ok"}));
        });

        let ctx = context_with(&server)?;
        handle_status(&ctx)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_and_processes_hit_their_endpoints() -> Result<()> {
        let server = MockServer::start_async().await;
        let cleanup = server.mock(|when, then| {
            when.method(POST).path("/cleanup");
            then.status(200).json_body(json!({"removed": 2}));
        });
        let processes = server.mock(|when, then| {
            when.method(GET).path("/processes");
            then.status(200).json_body(json!({"processes": []}));
        });

        let ctx = context_with(&server)?;
        handle_cleanup(&ctx)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        handle_processes(&ctx)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        cleanup.assert();
        processes.assert();
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status");
            then.status(503).body("warming up");
        });

        let ctx = context_with(&server)?;
        let err = handle_status(&ctx).await.err();
        assert!(
            matches!(err, Some(CliError::Failure(error)) if error.to_string().contains("warming up"))
        );
        Ok(())
    }
}
