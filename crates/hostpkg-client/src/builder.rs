//! Command construction for package-manager backends
//!
//! One builder per backend maps intents to [`CommandSpec`]s, replacing the
//! per-backend function triplication with a single vocabulary table. All
//! argument validation happens here, before anything reaches an executor.

use crate::config::ClientConfig;
use crate::error::PackageError;
use crate::types::{Backend, CommandSpec, Intent};

/// Options for `install`
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Answer all prompts with "yes" and run non-interactively
    pub assume_yes: bool,
    /// Do not treat recommended packages as dependencies (apt/zypper)
    pub no_install_recommends: bool,
    /// Treat suggested packages as dependencies (apt only)
    pub install_suggests: bool,
    /// Pass apt's `--force-yes` (apt only)
    pub force_yes: bool,
    /// Override the configured elevation for this call
    pub elevate: Option<bool>,
    /// Override the configured quietness for this call
    pub quiet: Option<bool>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            assume_yes: true,
            no_install_recommends: false,
            install_suggests: false,
            force_yes: false,
            elevate: None,
            quiet: None,
        }
    }
}

impl InstallOptions {
    #[must_use]
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    #[must_use]
    pub fn with_no_install_recommends(mut self, no_install_recommends: bool) -> Self {
        self.no_install_recommends = no_install_recommends;
        self
    }

    #[must_use]
    pub fn with_install_suggests(mut self, install_suggests: bool) -> Self {
        self.install_suggests = install_suggests;
        self
    }

    #[must_use]
    pub fn with_force_yes(mut self, force_yes: bool) -> Self {
        self.force_yes = force_yes;
        self
    }

    #[must_use]
    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = Some(elevate);
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}

/// Options for `update`
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Restrict the update to one `sources.list.d` file (apt only)
    pub source_name: Option<String>,
    /// Override the configured elevation for this call
    pub elevate: Option<bool>,
    /// Override the configured quietness for this call
    pub quiet: Option<bool>,
}

impl UpdateOptions {
    #[must_use]
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    #[must_use]
    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = Some(elevate);
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}

/// Options for operations whose only knob is the confirmation prompt
/// (`upgrade`, `dist_upgrade`, `autoremove`, `build_dep`)
#[derive(Debug, Clone)]
pub struct ConfirmOptions {
    /// Answer all prompts with "yes" and run non-interactively
    pub assume_yes: bool,
    /// Override the configured elevation for this call
    pub elevate: Option<bool>,
    /// Override the configured quietness for this call
    pub quiet: Option<bool>,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            assume_yes: true,
            elevate: None,
            quiet: None,
        }
    }
}

impl ConfirmOptions {
    #[must_use]
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    #[must_use]
    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = Some(elevate);
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}

/// Options for `remove`
#[derive(Debug, Clone)]
pub struct RemoveOptions {
    /// Delete configuration files too (apt only)
    pub purge: bool,
    /// Answer all prompts with "yes" and run non-interactively
    pub assume_yes: bool,
    /// Override the configured elevation for this call
    pub elevate: Option<bool>,
    /// Override the configured quietness for this call
    pub quiet: Option<bool>,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            purge: false,
            assume_yes: true,
            elevate: None,
            quiet: None,
        }
    }
}

impl RemoveOptions {
    #[must_use]
    pub fn with_purge(mut self, purge: bool) -> Self {
        self.purge = purge;
        self
    }

    #[must_use]
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    #[must_use]
    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = Some(elevate);
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}

/// Options for `fetch_source`
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Download the source package without unpacking it
    pub download_only: bool,
    /// Override the elevation for this call (source fetching defaults to
    /// unprivileged)
    pub elevate: Option<bool>,
    /// Override the configured quietness for this call
    pub quiet: Option<bool>,
}

impl SourceOptions {
    #[must_use]
    pub fn with_download_only(mut self, download_only: bool) -> Self {
        self.download_only = download_only;
        self
    }

    #[must_use]
    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = Some(elevate);
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}

/// Options for flagless operations (`clean`, `autoclean`)
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Override the configured elevation for this call
    pub elevate: Option<bool>,
    /// Override the configured quietness for this call
    pub quiet: Option<bool>,
}

impl RunOptions {
    #[must_use]
    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = Some(elevate);
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}

/// Command vocabulary for a `(backend, intent)` pair: the program to invoke
/// and the subcommand tokens that follow it.
///
/// Pairs with no vocabulary fail with `UnsupportedOperation`; this is the
/// single place backend capability is decided.
fn vocabulary(
    backend: Backend,
    intent: Intent,
) -> Result<(&'static str, &'static [&'static str]), PackageError> {
    let vocab: (&'static str, &'static [&'static str]) = match (backend, intent) {
        (_, Intent::Install) => (backend.program(), &["install"]),
        (Backend::Apt, Intent::Update) => ("apt-get", &["update"]),
        (Backend::Yum, Intent::Update) => ("yum", &["makecache"]),
        (Backend::Zypper, Intent::Update) => ("zypper", &["refresh"]),
        (Backend::Apt, Intent::Upgrade) => ("apt-get", &["upgrade"]),
        (Backend::Yum, Intent::Upgrade) => ("yum", &["upgrade"]),
        (Backend::Zypper, Intent::Upgrade) => ("zypper", &["update"]),
        (Backend::Apt, Intent::DistUpgrade) => ("apt-get", &["dist-upgrade"]),
        (Backend::Yum, Intent::DistUpgrade) => ("yum", &["distro-sync"]),
        (Backend::Zypper, Intent::DistUpgrade) => ("zypper", &["dist-upgrade"]),
        (_, Intent::Remove) => (backend.program(), &["remove"]),
        (Backend::Yum, Intent::Clean) => ("yum", &["clean", "all"]),
        (_, Intent::Clean) => (backend.program(), &["clean"]),
        (Backend::Apt, Intent::AutoClean) => ("apt-get", &["autoclean"]),
        (Backend::Yum, Intent::AutoClean) => ("yum", &["autoclean"]),
        // zypper has a single cache-cleaning command
        (Backend::Zypper, Intent::AutoClean) => ("zypper", &["clean"]),
        (Backend::Apt | Backend::Yum, Intent::AutoRemove) => (backend.program(), &["autoremove"]),
        (Backend::Apt, Intent::FetchSource) => ("apt-get", &["source"]),
        (Backend::Apt, Intent::BuildDep) => ("apt-get", &["build-dep"]),
        (Backend::Apt, Intent::CheckInstalled) => ("dpkg", &["-s"]),
        (Backend::Yum | Backend::Zypper, Intent::CheckInstalled) => ("rpm", &["-q"]),
        (Backend::Apt, Intent::CheckVersionAvailable) => ("apt-cache", &["madison"]),
        _ => return Err(PackageError::UnsupportedOperation { backend, intent }),
    };
    Ok(vocab)
}

/// Validate a name that will appear verbatim in a shell command line.
///
/// Anything outside the package-name character set is rejected rather than
/// escaped, so a rendered command is always byte-stable and single-line.
pub(crate) fn validate_name(kind: &str, value: &str) -> Result<String, PackageError> {
    if value.is_empty() {
        return Err(PackageError::InvalidArgument(format!("empty {kind}")));
    }
    let safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | ':' | '~' | '-'));
    if !safe {
        return Err(PackageError::InvalidArgument(format!(
            "{kind} `{value}` contains shell-unsafe characters"
        )));
    }
    Ok(value.to_owned())
}

fn require_packages(intent: Intent, packages: &[&str]) -> Result<Vec<String>, PackageError> {
    if packages.is_empty() {
        return Err(PackageError::InvalidArgument(format!(
            "{intent} requires at least one package"
        )));
    }
    packages
        .iter()
        .map(|p| validate_name("package name", p))
        .collect()
}

/// Maps `(intent, parameters)` to a [`CommandSpec`] for one backend
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    backend: Backend,
    defaults: ClientConfig,
}

impl CommandBuilder {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self::with_defaults(backend, ClientConfig::default())
    }

    /// Create a builder with explicit defaults for elevation and quietness
    #[must_use]
    pub fn with_defaults(backend: Backend, defaults: ClientConfig) -> Self {
        Self { backend, defaults }
    }

    /// Backend this builder targets
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    fn resolve(&self, elevate: Option<bool>, quiet: Option<bool>) -> (bool, bool) {
        (
            elevate.unwrap_or(self.defaults.elevate),
            quiet.unwrap_or(self.defaults.quiet),
        )
    }

    fn unsupported_option(&self, option: &'static str) -> PackageError {
        PackageError::UnsupportedOption {
            backend: self.backend,
            option,
        }
    }

    fn confirm_options(&self, assume_yes: bool) -> Vec<String> {
        if assume_yes {
            vec![self.backend.confirm_flag().to_owned()]
        } else {
            Vec::new()
        }
    }

    /// Install one or more packages
    pub fn install(
        &self,
        packages: &[&str],
        opts: &InstallOptions,
    ) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::Install)?;
        let targets = require_packages(Intent::Install, packages)?;

        let mut options = self.confirm_options(opts.assume_yes);
        if opts.no_install_recommends {
            options.push(match self.backend {
                Backend::Apt => "--no-install-recommends".to_owned(),
                Backend::Zypper => "--no-recommends".to_owned(),
                Backend::Yum => return Err(self.unsupported_option("no_install_recommends")),
            });
        }
        if opts.install_suggests {
            if self.backend != Backend::Apt {
                return Err(self.unsupported_option("install_suggests"));
            }
            options.push("--install-suggests".to_owned());
        }
        if opts.force_yes {
            if self.backend != Backend::Apt {
                return Err(self.unsupported_option("force_yes"));
            }
            options.push("--force-yes".to_owned());
        }

        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::Install,
            program,
            subcommand,
            options,
            targets,
            elevate,
            quiet,
        ))
    }

    /// Refresh the package index
    pub fn update(&self, opts: &UpdateOptions) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::Update)?;

        let mut options = Vec::new();
        if let Some(source_name) = &opts.source_name {
            if self.backend != Backend::Apt {
                return Err(self.unsupported_option("source_name"));
            }
            let source_name = validate_name("source name", source_name)?;
            options.push("-o".to_owned());
            options.push("Dir::Etc::sourceparts='-'".to_owned());
            options.push("-o".to_owned());
            options.push(format!(
                "Dir::Etc::sourcelist='sources.list.d/{source_name}.list'"
            ));
        }

        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::Update,
            program,
            subcommand,
            options,
            Vec::new(),
            elevate,
            quiet,
        ))
    }

    /// Upgrade all installed packages
    pub fn upgrade(&self, opts: &ConfirmOptions) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::Upgrade)?;
        let options = self.confirm_options(opts.assume_yes);
        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::Upgrade,
            program,
            subcommand,
            options,
            Vec::new(),
            elevate,
            quiet,
        ))
    }

    /// Upgrade with dependency changes handled
    pub fn dist_upgrade(&self, opts: &ConfirmOptions) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::DistUpgrade)?;
        // yum's distro-sync takes no confirmation flag; preserved quirk
        let options = if self.backend == Backend::Yum {
            Vec::new()
        } else {
            self.confirm_options(opts.assume_yes)
        };
        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::DistUpgrade,
            program,
            subcommand,
            options,
            Vec::new(),
            elevate,
            quiet,
        ))
    }

    /// Remove one or more packages
    pub fn remove(
        &self,
        packages: &[&str],
        opts: &RemoveOptions,
    ) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::Remove)?;
        let targets = require_packages(Intent::Remove, packages)?;

        let mut options = self.confirm_options(opts.assume_yes);
        if opts.purge {
            // only apt deletes configuration on removal; a silent downgrade
            // of that request would be a correctness trap
            if self.backend != Backend::Apt {
                return Err(self.unsupported_option("purge"));
            }
            options.push("--purge".to_owned());
        }

        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::Remove,
            program,
            subcommand,
            options,
            targets,
            elevate,
            quiet,
        ))
    }

    /// Clear out retrieved package files
    pub fn clean(&self, opts: &RunOptions) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::Clean)?;
        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::Clean,
            program,
            subcommand,
            Vec::new(),
            Vec::new(),
            elevate,
            quiet,
        ))
    }

    /// Clear out package files that can no longer be downloaded
    pub fn autoclean(&self, opts: &RunOptions) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::AutoClean)?;
        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::AutoClean,
            program,
            subcommand,
            Vec::new(),
            Vec::new(),
            elevate,
            quiet,
        ))
    }

    /// Remove packages that were installed as dependencies and are no longer
    /// needed
    pub fn autoremove(&self, opts: &ConfirmOptions) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::AutoRemove)?;
        let options = self.confirm_options(opts.assume_yes);
        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::AutoRemove,
            program,
            subcommand,
            options,
            Vec::new(),
            elevate,
            quiet,
        ))
    }

    /// Download a source package
    pub fn fetch_source(
        &self,
        package: &str,
        opts: &SourceOptions,
    ) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::FetchSource)?;
        let target = validate_name("package name", package)?;

        let mut options = Vec::new();
        if opts.download_only {
            options.push("--download-only".to_owned());
        }

        // fetching sources needs no privileges
        let elevate = opts.elevate.unwrap_or(false);
        let quiet = opts.quiet.unwrap_or(self.defaults.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::FetchSource,
            program,
            subcommand,
            options,
            vec![target],
            elevate,
            quiet,
        ))
    }

    /// Install the build dependencies of a source package
    pub fn build_dep(
        &self,
        package: &str,
        opts: &ConfirmOptions,
    ) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::BuildDep)?;
        let target = validate_name("package name", package)?;
        let options = self.confirm_options(opts.assume_yes);
        let (elevate, quiet) = self.resolve(opts.elevate, opts.quiet);
        Ok(CommandSpec::new(
            self.backend,
            Intent::BuildDep,
            program,
            subcommand,
            options,
            vec![target],
            elevate,
            quiet,
        ))
    }

    /// Query whether a package is installed; probes always run quietly
    pub fn check_installed(&self, package: &str) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::CheckInstalled)?;
        let target = validate_name("package name", package)?;
        Ok(CommandSpec::new(
            self.backend,
            Intent::CheckInstalled,
            program,
            subcommand,
            Vec::new(),
            vec![target],
            self.defaults.elevate,
            true,
        ))
    }

    /// Query repository metadata for available versions; runs unprivileged
    /// and quietly
    pub fn check_version_available(&self, package: &str) -> Result<CommandSpec, PackageError> {
        let (program, subcommand) = vocabulary(self.backend, Intent::CheckVersionAvailable)?;
        let target = validate_name("package name", package)?;
        Ok(CommandSpec::new(
            self.backend,
            Intent::CheckVersionAvailable,
            program,
            subcommand,
            Vec::new(),
            vec![target],
            false,
            true,
        ))
    }
}
