use anyhow::{Context, anyhow};
use llf_client::ConfigUpdate;
use serde_json::Value;

use crate::cli::{ConfigGetArgs, ConfigSetArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_json;

pub(crate) async fn handle_config_get(ctx: &AppContext, args: ConfigGetArgs) -> CliResult<()> {
    let path = args.path.trim();
    if path.trim_start_matches('/').is_empty() {
        return Err(CliError::validation("configuration path must not be empty"));
    }
    let document = ctx.client.get_config(path).await?;
    render_json(&document)
}

pub(crate) async fn handle_config_set(ctx: &AppContext, args: ConfigSetArgs) -> CliResult<()> {
    let payload = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))
        .map_err(CliError::failure)?;

    let config: Value = serde_json::from_str(&payload)
        .map_err(|err| CliError::validation(format!("config file is not valid JSON: {err}")))?;
    if !config.is_object() {
        return Err(CliError::validation(
            "config file must contain a JSON object",
        ));
    }

    let update = ConfigUpdate {
        file_path: args.path,
        config,
        modified_file_path: args.dest,
    };
    let result = ctx
        .client
        .update_config(&update, args.format.into())
        .await
        .map_err(|err| match err {
            llf_client::ClientError::Decode { .. } => {
                CliError::failure(anyhow!("server confirmation was not valid JSON"))
            }
            other => other.into(),
        })?;
    render_json(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use llf_client::{ClientConfig, RemoteServiceClient};
    use serde_json::json;

    use crate::cli::DocumentFormat;

    fn context_with(server: &MockServer) -> Result<AppContext> {
        Ok(AppContext {
            client: RemoteServiceClient::with_config(ClientConfig::new(server.base_url()))?,
        })
    }

    #[tokio::test]
    async fn config_get_fetches_document() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/config/configs/model.yaml");
            then.status(200)
                .json_body(json!({"model_name_or_path": "qwen"}));
        });

        let ctx = context_with(&server)?;
        handle_config_get(
            &ctx,
            ConfigGetArgs {
                path: "/configs/model.yaml".to_string(),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn config_get_rejects_empty_path() -> Result<()> {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server)?;
        let err = handle_config_get(
            &ctx,
            ConfigGetArgs {
                path: " / ".to_string(),
            },
        )
        .await
        .err();
        assert!(matches!(err, Some(CliError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn config_set_sends_payload() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/update_json").json_body(json!({
                "file_path": "configs/ds.json",
                "config": {"zero_stage": 3},
                "modified_file_path": "configs/ds.out.json"
            }));
            then.status(200).json_body(json!({"ok": true}));
        });

        let dir = tempfile::tempdir()?;
        let file = dir.path().join("values.json");
        std::fs::write(&file, r#"{"zero_stage": 3}"#)?;

        let ctx = context_with(&server)?;
        handle_config_set(
            &ctx,
            ConfigSetArgs {
                path: "configs/ds.json".to_string(),
                file,
                dest: Some("configs/ds.out.json".to_string()),
                format: DocumentFormat::Json,
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn config_set_rejects_non_object_documents() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/update_yaml");
            then.status(200).json_body(json!({"ok": true}));
        });

        let dir = tempfile::tempdir()?;
        let file = dir.path().join("values.json");
        std::fs::write(&file, "[1, 2, 3]")?;

        let ctx = context_with(&server)?;
        let err = handle_config_set(
            &ctx,
            ConfigSetArgs {
                path: "configs/model.yaml".to_string(),
                file,
                dest: None,
                format: DocumentFormat::Yaml,
            },
        )
        .await
        .err();
        assert!(matches!(err, Some(CliError::Validation(_))));
        mock.assert_calls(0);
        Ok(())
    }
}
