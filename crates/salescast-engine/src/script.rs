//! Subprocess realization of the model backend.
//!
//! Launches the forecasting / basket-mining scripts with `python -u` and a
//! fixed positional-argument contract, then applies the two-stream output
//! protocol:
//!
//! - the last stdout line that (trimmed) starts with `{` and ends with `}`
//!   is the authoritative result; everything else is diagnostic noise;
//! - a parseable JSON object with an `error` field on stderr takes
//!   precedence over anything captured on stdout;
//! - the forecasting path is bounded by a hard timeout that kills the
//!   child process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};

use crate::error::GatewayError;
use crate::gateway::{BasketJob, ForecastJob, ModelBackend};

/// Script file names under the configured scripts directory.
pub const FORECAST_SCRIPT: &str = "forecast.py";
pub const BASKET_SCRIPT: &str = "market_basket.py";

#[derive(Debug, Clone)]
pub struct ScriptBackendConfig {
    /// Interpreter used to launch the scripts.
    pub python_bin: String,
    pub scripts_dir: PathBuf,
    /// Hard timeout for one forecasting invocation. The basket path runs
    /// without a timeout, matching the original system's asymmetry.
    pub forecast_timeout: Duration,
}

/// [`ModelBackend`] that runs the model computation as a subprocess.
#[derive(Debug, Clone)]
pub struct ScriptBackend {
    config: ScriptBackendConfig,
}

impl ScriptBackend {
    #[must_use]
    pub fn new(config: ScriptBackendConfig) -> Self {
        Self { config }
    }

    async fn run_script(
        &self,
        script: &str,
        args: Vec<String>,
        timeout: Option<Duration>,
    ) -> Result<Value, GatewayError> {
        let path = self.config.scripts_dir.join(script);
        let mut child = Command::new(&self.config.python_bin)
            .arg("-u")
            .arg(&path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GatewayError::Process(std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GatewayError::Process(std::io::Error::other("stderr not captured")))?;

        // Both streams are drained concurrently: a child blocked on a full
        // stderr pipe while we read stdout would deadlock.
        let collect = async {
            let (last_line, stderr_text) = tokio::join!(scan_stdout(stdout), read_stderr(stderr));
            let last_line = last_line?;
            let stderr_text = stderr_text?;
            let status = child.wait().await?;
            Ok::<_, GatewayError>((last_line, stderr_text, status))
        };

        let (last_line, stderr_text, status) = match timeout {
            Some(limit) => match tokio::time::timeout(limit, collect).await {
                Ok(collected) => collected?,
                Err(_) => {
                    child.start_kill().ok();
                    let _ = child.wait().await;
                    return Err(GatewayError::Timeout(limit.as_secs()));
                }
            },
            None => collect.await?,
        };

        if !status.success() {
            tracing::debug!(script, code = ?status.code(), "model process exited non-zero");
        }

        evaluate_streams(last_line, &stderr_text)
    }
}

#[async_trait]
impl ModelBackend for ScriptBackend {
    async fn run_forecast(&self, job: &ForecastJob) -> Result<Value, GatewayError> {
        let args = vec![
            job.dataset_json.clone(),
            job.period.to_string(),
            job.model.to_string(),
            job.start.to_string(),
            job.end.to_string(),
        ];
        self.run_script(FORECAST_SCRIPT, args, Some(self.config.forecast_timeout))
            .await
    }

    async fn run_basket(&self, job: &BasketJob) -> Result<Value, GatewayError> {
        let args = vec![
            job.dataset_json.clone(),
            job.min_support.to_string(),
            job.min_confidence.to_string(),
        ];
        self.run_script(BASKET_SCRIPT, args, None).await
    }
}

/// Capture the last syntactically complete JSON object line on stdout.
async fn scan_stdout(stdout: ChildStdout) -> Result<Option<String>, GatewayError> {
    let mut lines = BufReader::new(stdout).lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            last = Some(trimmed.to_string());
        } else if !trimmed.is_empty() {
            tracing::debug!(line = trimmed, "model diagnostic output");
        }
    }
    Ok(last)
}

async fn read_stderr(stderr: ChildStderr) -> Result<String, GatewayError> {
    let mut text = String::new();
    BufReader::new(stderr).read_to_string(&mut text).await?;
    Ok(text)
}

/// Apply the dual-stream precedence rule to the drained output.
fn evaluate_streams(last_line: Option<String>, stderr: &str) -> Result<Value, GatewayError> {
    // An explicit error object on the diagnostic stream wins, even when a
    // valid-looking result line was captured on stdout.
    if let Some(message) = stderr_error(stderr) {
        return Err(GatewayError::Model(message));
    }

    let line = last_line.ok_or(GatewayError::EmptyOutput)?;
    let value: Value =
        serde_json::from_str(line.trim()).map_err(|e| GatewayError::Malformed {
            reason: e.to_string(),
            raw: line.clone(),
        })?;

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(GatewayError::Model(message.to_string()));
    }

    Ok(value)
}

/// Look for a JSON object with an `error` field among the stderr lines.
fn stderr_error(stderr: &str) -> Option<String> {
    for line in stderr.lines() {
        let trimmed = line.trim();
        if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if let Some(message) = value.get("error").and_then(Value::as_str) {
                return Some(message.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_json_line_is_authoritative() {
        let result = evaluate_streams(Some(r#"{"predictions": []}"#.to_string()), "");
        assert!(result.is_ok());
    }

    #[test]
    fn stderr_error_takes_precedence_over_stdout_result() {
        let result = evaluate_streams(
            Some(r#"{"predictions": [{"date": "2024-03-01"}]}"#.to_string()),
            "traceback noise\n{\"error\": \"model diverged\"}\n",
        );
        assert!(
            matches!(result, Err(GatewayError::Model(ref m)) if m == "model diverged"),
            "got: {result:?}"
        );
    }

    #[test]
    fn non_json_stderr_is_ignored() {
        let result = evaluate_streams(
            Some(r#"{"predictions": []}"#.to_string()),
            "FutureWarning: something deprecated\n",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn missing_output_is_empty_output() {
        let result = evaluate_streams(None, "");
        assert!(matches!(result, Err(GatewayError::EmptyOutput)));
    }

    #[test]
    fn unparseable_line_is_malformed_with_raw_output() {
        let result = evaluate_streams(Some("{not json}".to_string()), "");
        assert!(
            matches!(result, Err(GatewayError::Malformed { ref raw, .. }) if raw == "{not json}")
        );
    }

    #[test]
    fn error_field_in_result_is_a_model_error() {
        let result = evaluate_streams(Some(r#"{"error": "no data after aggregation"}"#.to_string()), "");
        assert!(
            matches!(result, Err(GatewayError::Model(ref m)) if m == "no data after aggregation")
        );
    }
}
