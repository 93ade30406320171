//! Executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::ExecResult;

/// Command execution seam.
///
/// The package-management client never spawns processes itself; every command
/// line it builds goes through an `Executor`. Implementations decide what
/// "run" means (local shell, SSH session, container exec, test double).
///
/// * `elevate` - run with administrative privileges instead of as the
///   invoking user
/// * `env` - environment variables scoped to this single command
/// * `quiet` - suppress output-bearing log lines; the result still carries
///   captured stdout/stderr
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(
        &self,
        command: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
    ) -> Result<ExecResult, ExecError>;

    async fn run_with_timeout(
        &self,
        command: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
        timeout: Duration,
    ) -> Result<ExecResult, ExecError>;

    /// Check whether a path exists on the target.
    ///
    /// Default implementation probes with `test -e`; implementations with a
    /// cheaper native check may override.
    async fn path_exists(
        &self,
        path: &str,
        elevate: bool,
        quiet: bool,
    ) -> Result<bool, ExecError> {
        let result = self
            .run(&format!("test -e {path}"), elevate, &[], quiet)
            .await?;
        Ok(result.success())
    }

    fn executor_type(&self) -> &'static str;
}
