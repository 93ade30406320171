//! hostpkg-client: Package-manager command construction and dispatch
//!
//! Builds the exact command lines for apt, yum, and zypper, runs them through
//! a pluggable [`Executor`](hostpkg_exec::Executor), and interprets the
//! results.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use builder::{
    CommandBuilder, ConfirmOptions, InstallOptions, RemoveOptions, RunOptions, SourceOptions,
    UpdateOptions,
};
pub use client::PackageManagerClient;
pub use config::ClientConfig;
pub use error::PackageError;
pub use types::{Backend, CommandOutcome, CommandSpec, Intent};
