//! Local command execution using `tokio::process`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::error::ExecError;
use crate::result::ExecResult;
use crate::traits::Executor;

/// Local command executor
///
/// Executes commands on the local machine using `tokio::process::Command`.
/// Elevated commands run through `sudo`, with the scoped environment passed
/// as leading `KEY=VALUE` arguments so sudo applies it to the child.
#[derive(Debug, Clone)]
pub struct LocalExecutor;

impl LocalExecutor {
    /// Create a new local executor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Internal method to execute command
    async fn execute(
        &self,
        cmd: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
    ) -> Result<ExecResult, ExecError> {
        let start = Instant::now();

        if !quiet {
            debug!(command = %cmd, elevate, "executing local command");
        }

        // Use a shell to support pipes, redirections, etc.
        let mut process = if elevate {
            let mut process = Command::new("sudo");
            for (key, value) in env {
                process.arg(format!("{key}={value}"));
            }
            process.arg("sh").arg("-c").arg(cmd);
            process
        } else {
            let mut process = Command::new("sh");
            process.arg("-c").arg(cmd);
            process.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            process
        };

        let child = process
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !quiet {
            debug!(
                command = %cmd,
                status = status,
                duration = ?duration,
                "command completed"
            );

            if !output.status.success() {
                error!(
                    command = %cmd,
                    status = status,
                    stderr = %stderr,
                    "command failed"
                );
            }
        }

        Ok(ExecResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    #[instrument(skip(self, env), level = "debug")]
    async fn run(
        &self,
        command: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
    ) -> Result<ExecResult, ExecError> {
        self.execute(command, elevate, env, quiet).await
    }

    #[instrument(skip(self, env), level = "debug")]
    async fn run_with_timeout(
        &self,
        command: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
        timeout_duration: Duration,
    ) -> Result<ExecResult, ExecError> {
        let start = Instant::now();

        if !quiet {
            debug!(command = %command, timeout = ?timeout_duration, "executing with timeout");
        }

        let result = timeout(
            timeout_duration,
            self.execute(command, elevate, env, quiet),
        )
        .await;

        match result {
            Ok(Ok(exec_result)) => Ok(exec_result),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                error!(
                    command = %command,
                    timeout = ?timeout_duration,
                    elapsed = ?start.elapsed(),
                    "command timed out"
                );
                Err(ExecError::Timeout {
                    timeout: timeout_duration,
                })
            }
        }
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let executor = LocalExecutor::new();
        let result = executor.run("echo hello", false, &[], false).await.unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_failure() {
        let executor = LocalExecutor::new();
        let result = executor.run("exit 42", false, &[], true).await.unwrap();

        assert!(!result.success());
        assert_eq!(result.status, 42);
    }

    #[tokio::test]
    async fn test_run_applies_env() {
        let executor = LocalExecutor::new();
        let env = vec![("HOSTPKG_TEST_VAR".to_string(), "noninteractive".to_string())];
        let result = executor
            .run("echo \"$HOSTPKG_TEST_VAR\"", false, &env, false)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "noninteractive");
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let executor = LocalExecutor::new();
        let result = executor
            .run_with_timeout("sleep 5", false, &[], true, Duration::from_millis(100))
            .await;

        assert!(matches!(result, Err(ExecError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_run_with_stderr() {
        let executor = LocalExecutor::new();
        let result = executor
            .run("echo error >&2", false, &[], false)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stderr.trim(), "error");
    }

    #[tokio::test]
    async fn test_path_exists() {
        let executor = LocalExecutor::new();

        assert!(executor.path_exists("/", false, true).await.unwrap());
        assert!(
            !executor
                .path_exists("/nonexistent-hostpkg-path", false, true)
                .await
                .unwrap()
        );
    }
}
