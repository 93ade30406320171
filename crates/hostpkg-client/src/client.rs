//! Package-management client
//!
//! One entry point per intent. Mutating operations surface non-zero exit as
//! [`PackageError::CommandFailed`]; query predicates coerce it into `false`,
//! since "command failed" and "condition absent" are indistinguishable for
//! those probes.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use hostpkg_exec::traits::Executor;

use crate::builder::{
    self, CommandBuilder, ConfirmOptions, InstallOptions, RemoveOptions, RunOptions,
    SourceOptions, UpdateOptions,
};
use crate::config::ClientConfig;
use crate::error::PackageError;
use crate::types::{Backend, CommandOutcome, CommandSpec, Intent};

/// Marker file apt leaves behind when an update requires a reboot
const REBOOT_REQUIRED_MARKER: &str = "/var/run/reboot-required";

/// Package-management client for a single backend
///
/// Builds commands through a [`CommandBuilder`] and executes them through the
/// supplied [`Executor`]. The client itself performs no process or network
/// I/O.
pub struct PackageManagerClient {
    executor: Arc<dyn Executor>,
    builder: CommandBuilder,
    backend: Backend,
}

impl PackageManagerClient {
    /// Create a client with default configuration (elevated, not quiet)
    pub fn new(backend: Backend, executor: Arc<dyn Executor>) -> Self {
        Self::with_config(backend, executor, ClientConfig::default())
    }

    /// Create a client with explicit defaults for elevation and quietness
    pub fn with_config(
        backend: Backend,
        executor: Arc<dyn Executor>,
        config: ClientConfig,
    ) -> Self {
        Self {
            executor,
            builder: CommandBuilder::with_defaults(backend, config),
            backend,
        }
    }

    /// Backend this client targets
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Render and execute a spec, returning the literal command line alongside
    /// the raw result
    async fn dispatch(&self, spec: &CommandSpec) -> Result<CommandOutcome, PackageError> {
        let command = spec.render();
        let env = vec![(
            self.backend.frontend_var().to_owned(),
            "noninteractive".to_owned(),
        )];

        debug!(command = %command, elevate = spec.elevate, "dispatching");

        let result = self
            .executor
            .run(&command, spec.elevate, &env, spec.quiet)
            .await
            .map_err(|e| PackageError::ExecutionError(e.to_string()))?;

        Ok(CommandOutcome { command, result })
    }

    /// Dispatch a mutating command; non-zero exit is an error
    async fn dispatch_checked(&self, spec: &CommandSpec) -> Result<CommandOutcome, PackageError> {
        let outcome = self.dispatch(spec).await?;
        if !outcome.result.success() {
            return Err(PackageError::CommandFailed {
                command: outcome.command,
                status: outcome.result.status,
                stderr: outcome.result.stderr,
            });
        }
        Ok(outcome)
    }

    /// Install packages
    #[instrument(skip(self, opts))]
    pub async fn install(
        &self,
        packages: &[&str],
        opts: InstallOptions,
    ) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.install(packages, &opts)?;
        let outcome = self.dispatch_checked(&spec).await?;
        info!(backend = %self.backend, count = packages.len(), "packages installed");
        Ok(outcome)
    }

    /// Refresh the package index
    #[instrument(skip(self, opts))]
    pub async fn update(&self, opts: UpdateOptions) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.update(&opts)?;
        self.dispatch_checked(&spec).await
    }

    /// Install the newest versions of all packages
    #[instrument(skip(self, opts))]
    pub async fn upgrade(&self, opts: ConfirmOptions) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.upgrade(&opts)?;
        let outcome = self.dispatch_checked(&spec).await?;
        info!(backend = %self.backend, "upgrade completed");
        Ok(outcome)
    }

    /// Upgrade, handling changed dependencies as needed
    #[instrument(skip(self, opts))]
    pub async fn dist_upgrade(&self, opts: ConfirmOptions) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.dist_upgrade(&opts)?;
        let outcome = self.dispatch_checked(&spec).await?;
        info!(backend = %self.backend, "dist-upgrade completed");
        Ok(outcome)
    }

    /// Remove packages
    #[instrument(skip(self, opts))]
    pub async fn remove(
        &self,
        packages: &[&str],
        opts: RemoveOptions,
    ) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.remove(packages, &opts)?;
        let outcome = self.dispatch_checked(&spec).await?;
        info!(backend = %self.backend, count = packages.len(), "packages removed");
        Ok(outcome)
    }

    /// Clear out retrieved package files
    #[instrument(skip(self, opts))]
    pub async fn clean(&self, opts: RunOptions) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.clean(&opts)?;
        self.dispatch_checked(&spec).await
    }

    /// Clear out package files that can no longer be downloaded
    #[instrument(skip(self, opts))]
    pub async fn autoclean(&self, opts: RunOptions) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.autoclean(&opts)?;
        self.dispatch_checked(&spec).await
    }

    /// Remove packages installed as dependencies that are no longer needed
    #[instrument(skip(self, opts))]
    pub async fn autoremove(&self, opts: ConfirmOptions) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.autoremove(&opts)?;
        self.dispatch_checked(&spec).await
    }

    /// Download a source package
    #[instrument(skip(self, opts))]
    pub async fn fetch_source(
        &self,
        package: &str,
        opts: SourceOptions,
    ) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.fetch_source(package, &opts)?;
        self.dispatch_checked(&spec).await
    }

    /// Install the build dependencies of a source package
    #[instrument(skip(self, opts))]
    pub async fn build_dep(
        &self,
        package: &str,
        opts: ConfirmOptions,
    ) -> Result<CommandOutcome, PackageError> {
        let spec = self.builder.build_dep(package, &opts)?;
        self.dispatch_checked(&spec).await
    }

    /// Check whether a package is installed.
    ///
    /// A non-zero exit from the probe means "not installed", never an error.
    /// On apt, exit status alone is not enough: `dpkg -s` also exits 0 for
    /// packages that were removed with their configuration left behind, so
    /// the status line is checked as well. rpm's exit code is authoritative.
    #[instrument(skip(self))]
    pub async fn is_installed(&self, package: &str) -> Result<bool, PackageError> {
        let spec = self.builder.check_installed(package)?;
        let outcome = self.dispatch(&spec).await?;

        if !outcome.result.success() {
            return Ok(false);
        }

        let installed = match self.backend {
            Backend::Apt => outcome.result.stdout.contains("install ok installed"),
            Backend::Yum | Backend::Zypper => true,
        };

        debug!(package, installed, "installation probe");
        Ok(installed)
    }

    /// Check whether installed updates require a reboot.
    ///
    /// apt leaves a marker file behind; the other backends have no equivalent
    /// signal, and reporting `false` for them would conflate "no reboot
    /// needed" with "cannot know", so they fail with `UnsupportedOperation`.
    #[instrument(skip(self))]
    pub async fn is_reboot_required(&self) -> Result<bool, PackageError> {
        match self.backend {
            Backend::Apt => self
                .executor
                .path_exists(REBOOT_REQUIRED_MARKER, false, true)
                .await
                .map_err(|e| PackageError::ExecutionError(e.to_string())),
            Backend::Yum | Backend::Zypper => Err(PackageError::UnsupportedOperation {
                backend: self.backend,
                intent: Intent::CheckRebootRequired,
            }),
        }
    }

    /// Check whether an exact version of a package is available from the
    /// configured repositories (apt only).
    ///
    /// A failed metadata query reads as "not available"; malformed rows in
    /// the output are skipped rather than fatal.
    #[instrument(skip(self))]
    pub async fn is_version_available(
        &self,
        package: &str,
        version: &str,
    ) -> Result<bool, PackageError> {
        let spec = self.builder.check_version_available(package)?;
        let version = builder::validate_name("version", version)?;

        let outcome = self.dispatch(&spec).await?;
        if !outcome.result.success() {
            return Ok(false);
        }

        let versions = Self::parse_madison_versions(&outcome.result.stdout);
        Ok(versions.iter().any(|v| *v == version))
    }

    /// Parse `apt-cache madison` output into candidate version strings
    ///
    /// Rows look like:
    /// ` apache2 | 2.4.7-1ubuntu4 | http://archive.ubuntu.com/ubuntu/ trusty/main amd64 Packages`
    fn parse_madison_versions(output: &str) -> Vec<String> {
        let mut versions = Vec::new();

        for line in output.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.splitn(3, '|');
            let _package = fields.next();
            // rows without a delimiter are malformed; skip them
            let Some(version) = fields.next() else {
                continue;
            };

            let version = version.trim();
            if !version.is_empty() {
                versions.push(version.to_owned());
            }
        }

        versions
    }
}
