//! Call command handler

use crate::cli::CallArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::{OutputFormatter, OutputWriter};
use bouncer_core::{dispatch, BounceService, Method};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument};

/// Invoke one call and print or save its response
#[instrument(skip_all, fields(method = %args.method))]
pub async fn handle_call(args: CallArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let method: Method = args.method.parse()?;
    let timer = Timer::with_details("call", method.name());

    if !args.masks.is_empty() && !method.accepts_field_mask() {
        return Err(Error::invalid_args(format!(
            "--mask is only accepted by calls that take a field mask, not {}",
            method
        )));
    }

    let mut request = read_request(args.request.as_deref()).await?;
    if !args.masks.is_empty() {
        add_mask_paths(&mut request, &args.masks)?;
    }

    let metadata = (!args.no_metadata).then(|| config.call_metadata(&args.headers));
    if let Some(metadata) = &metadata {
        debug!(metadata = ?redaction::redact_metadata(metadata), "Sending call metadata");
    }

    let response = dispatch(&BounceService::new(), method, &request, metadata.as_ref())?;
    info!(
        elapsed_us = timer.elapsed().as_micros() as u64,
        "Call completed"
    );

    match &args.save_to {
        Some(path) => {
            let mut content = output.format().format(&response)?;
            if !content.ends_with('\n') {
                content.push('\n');
            }
            tokio::fs::write(path, content).await?;
            output.success(&format!("✓ Response saved to {}", path.display()))?;
        }
        None => {
            output.section("Response")?;
            output.data(&response)?;
        }
    }

    Ok(())
}

/// Read the request body from a file, from stdin (`-`), or default to `{}`
async fn read_request(source: Option<&Path>) -> Result<Value> {
    let Some(path) = source else {
        return Ok(Value::Object(Map::new()));
    };

    if path == Path::new("-") {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        return parse_request(&content, path, false);
    }

    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = tokio::fs::read_to_string(path).await?;
    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    parse_request(&content, path, is_yaml)
}

fn parse_request(content: &str, path: &Path, is_yaml: bool) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let invalid = |expected: &str| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
    };

    if is_yaml {
        serde_yaml::from_str(content).map_err(|e| {
            debug!(error = %e, "Request is not valid YAML");
            invalid("YAML")
        })
    } else {
        serde_json::from_str(content).map_err(|e| {
            debug!(error = %e, "Request is not valid JSON");
            invalid("JSON")
        })
    }
}

/// Append `--mask` paths to the request's `field_mask.paths`
fn add_mask_paths(request: &mut Value, masks: &[String]) -> Result<()> {
    let body = request
        .as_object_mut()
        .ok_or_else(|| Error::invalid_args("--mask needs a JSON object request"))?;

    let field_mask = body
        .entry("field_mask")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::invalid_args("request field_mask is not an object"))?;

    let paths = field_mask
        .entry("paths")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| Error::invalid_args("request field_mask.paths is not a list"))?;

    paths.extend(masks.iter().cloned().map(Value::String));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(method: &str, request: Option<PathBuf>, save_to: PathBuf) -> CallArgs {
        CallArgs {
            method: method.to_string(),
            request,
            masks: Vec::new(),
            headers: Vec::new(),
            no_metadata: false,
            save_to: Some(save_to),
        }
    }

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_mask_paths_are_appended() {
        let mut request = json!({"field_mask": {"paths": ["int32_val"]}});
        add_mask_paths(&mut request, &["string_val".to_string()]).unwrap();
        assert_eq!(request["field_mask"]["paths"], json!(["int32_val", "string_val"]));

        let mut request = json!({});
        add_mask_paths(&mut request, &["any".to_string()]).unwrap();
        assert_eq!(request, json!({"field_mask": {"paths": ["any"]}}));

        let mut request = json!([1]);
        assert!(add_mask_paths(&mut request, &["any".to_string()]).is_err());
    }

    #[test]
    fn test_parse_request() {
        let path = Path::new("request.yaml");
        assert_eq!(
            parse_request("greeting: world\n", path, true).unwrap(),
            json!({"greeting": "world"})
        );
        assert_eq!(parse_request("  \n", path, false).unwrap(), json!({}));
        assert!(matches!(
            parse_request("{not json", path, false),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_call_saves_response() {
        let temp_dir = TempDir::new().unwrap();
        let request_path = temp_dir.path().join("request.json");
        let response_path = temp_dir.path().join("response.json");
        std::fs::write(&request_path, r#"{"greeting": "world", "boolean_test": true}"#).unwrap();

        let mut output = quiet_output();
        handle_call(
            args("SayHello", Some(request_path), response_path.clone()),
            &Config::default(),
            &mut output,
        )
        .await
        .unwrap();

        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(response_path).unwrap()).unwrap();
        assert_eq!(saved, json!({"reply": "hello world", "boolean_test": true}));
    }

    #[tokio::test]
    async fn test_call_sends_headers() {
        let temp_dir = TempDir::new().unwrap();
        let response_path = temp_dir.path().join("headers.json");

        let mut call = args("EchoHeaders", None, response_path.clone());
        call.headers = vec![("X-Trace".to_string(), "abc".to_string())];

        let mut output = quiet_output();
        handle_call(call, &Config::default(), &mut output).await.unwrap();

        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(response_path).unwrap()).unwrap();
        assert_eq!(saved, json!({"headers": [{"key": "x-trace", "value": "abc"}]}));
    }

    #[tokio::test]
    async fn test_call_without_metadata_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut call = args("EchoHeaders", None, temp_dir.path().join("out.json"));
        call.no_metadata = true;

        let err = handle_call(call, &Config::default(), &mut quiet_output())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 22);
    }

    #[tokio::test]
    async fn test_mask_rejected_for_other_calls() {
        let temp_dir = TempDir::new().unwrap();
        let mut call = args("Echo", None, temp_dir.path().join("out.json"));
        call.masks = vec!["string_val".to_string()];

        let err = handle_call(call, &Config::default(), &mut quiet_output())
            .await
            .unwrap_err();
        assert!(err.should_show_help());
    }
}
