//! Client configuration

use serde::{Deserialize, Serialize};

/// Defaults for privilege and output handling
///
/// Set once when the client is constructed; individual calls may override
/// both fields through their options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Run commands with administrative privileges
    #[serde(default = "default_elevate")]
    pub elevate: bool,
    /// Suppress command output
    #[serde(default)]
    pub quiet: bool,
}

fn default_elevate() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            elevate: true,
            quiet: false,
        }
    }
}
