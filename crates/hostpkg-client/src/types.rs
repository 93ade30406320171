//! Type definitions for package management

use serde::{Deserialize, Serialize};

use hostpkg_exec::ExecResult;

/// Package-manager backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// APT (Debian/Ubuntu)
    Apt,
    /// Yum (RHEL/CentOS)
    Yum,
    /// Zypper (SUSE)
    Zypper,
}

impl Backend {
    /// Program invoked for package-management commands
    #[must_use]
    pub fn program(&self) -> &'static str {
        match self {
            Backend::Apt => "apt-get",
            Backend::Yum => "yum",
            Backend::Zypper => "zypper",
        }
    }

    /// Flag that answers all prompts with "yes"
    #[must_use]
    pub fn confirm_flag(&self) -> &'static str {
        match self {
            Backend::Apt => "--yes",
            Backend::Yum => "--assumeyes",
            Backend::Zypper => "-y",
        }
    }

    /// Environment variable that selects the non-interactive frontend
    #[must_use]
    pub fn frontend_var(&self) -> &'static str {
        match self {
            Backend::Apt => "DEBIAN_FRONTEND",
            Backend::Yum => "REDHAT_FRONTEND",
            Backend::Zypper => "SUSE_FRONTEND",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Apt => write!(f, "apt"),
            Backend::Yum => write!(f, "yum"),
            Backend::Zypper => write!(f, "zypper"),
        }
    }
}

/// High-level package-management operation, independent of backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Install,
    Remove,
    Update,
    Upgrade,
    DistUpgrade,
    Clean,
    AutoClean,
    AutoRemove,
    FetchSource,
    BuildDep,
    CheckInstalled,
    CheckRebootRequired,
    CheckVersionAvailable,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Intent::Install => "install",
            Intent::Remove => "remove",
            Intent::Update => "update",
            Intent::Upgrade => "upgrade",
            Intent::DistUpgrade => "dist-upgrade",
            Intent::Clean => "clean",
            Intent::AutoClean => "autoclean",
            Intent::AutoRemove => "autoremove",
            Intent::FetchSource => "fetch-source",
            Intent::BuildDep => "build-dep",
            Intent::CheckInstalled => "check-installed",
            Intent::CheckRebootRequired => "check-reboot-required",
            Intent::CheckVersionAvailable => "check-version-available",
        };
        write!(f, "{name}")
    }
}

/// A fully built command, ready for dispatch
///
/// Immutable once constructed; built by
/// [`CommandBuilder`](crate::builder::CommandBuilder) and consumed by the
/// call that created it.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Backend the command targets
    pub backend: Backend,
    /// Operation the command performs
    pub intent: Intent,
    /// Flag tokens, in render order
    pub options: Vec<String>,
    /// Package names or other positional arguments
    pub targets: Vec<String>,
    /// Run with administrative privileges
    pub elevate: bool,
    /// Suppress output
    pub quiet: bool,
    /// Program the rendered command invokes (query intents use a different
    /// program than the backend's own, e.g. `dpkg` or `rpm`)
    program: &'static str,
    /// Subcommand tokens following the program
    subcommand: &'static [&'static str],
}

impl CommandSpec {
    pub(crate) fn new(
        backend: Backend,
        intent: Intent,
        program: &'static str,
        subcommand: &'static [&'static str],
        options: Vec<String>,
        targets: Vec<String>,
        elevate: bool,
        quiet: bool,
    ) -> Self {
        Self {
            backend,
            intent,
            options,
            targets,
            elevate,
            quiet,
            program,
            subcommand,
        }
    }

    /// Render the exact command line.
    ///
    /// Assembled from non-empty tokens joined by single spaces, so omitted
    /// optional flags never leave doubled or trailing whitespace. Yum places
    /// global flags before the subcommand; apt and zypper place them after.
    #[must_use]
    pub fn render(&self) -> String {
        let mut tokens: Vec<&str> = vec![self.program];

        match self.backend {
            Backend::Yum => {
                tokens.extend(self.options.iter().map(String::as_str));
                tokens.extend_from_slice(self.subcommand);
            }
            Backend::Apt | Backend::Zypper => {
                tokens.extend_from_slice(self.subcommand);
                tokens.extend(self.options.iter().map(String::as_str));
            }
        }

        tokens.extend(self.targets.iter().map(String::as_str));
        tokens.retain(|t| !t.is_empty());
        tokens.join(" ")
    }
}

/// Outcome of a dispatched command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Exact literal command line that was executed
    pub command: String,
    /// Raw result from the executor
    pub result: ExecResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_vocabulary() {
        assert_eq!(Backend::Apt.program(), "apt-get");
        assert_eq!(Backend::Apt.confirm_flag(), "--yes");
        assert_eq!(Backend::Yum.confirm_flag(), "--assumeyes");
        assert_eq!(Backend::Zypper.confirm_flag(), "-y");
        assert_eq!(Backend::Yum.frontend_var(), "REDHAT_FRONTEND");
    }

    #[test]
    fn test_render_joins_without_empty_tokens() {
        let spec = CommandSpec::new(
            Backend::Apt,
            Intent::Install,
            "apt-get",
            &["install"],
            vec!["--yes".to_string()],
            vec!["htop".to_string()],
            true,
            false,
        );
        assert_eq!(spec.render(), "apt-get install --yes htop");
    }

    #[test]
    fn test_render_yum_flags_precede_subcommand() {
        let spec = CommandSpec::new(
            Backend::Yum,
            Intent::Upgrade,
            "yum",
            &["upgrade"],
            vec!["--assumeyes".to_string()],
            Vec::new(),
            true,
            false,
        );
        assert_eq!(spec.render(), "yum --assumeyes upgrade");
    }
}
