// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Desktop Remote - CLI Config Module
// Loads client settings from disk and applies command-line overrides

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use desktop_remote_gui_core::ClientConfig;

/// CLI configuration (wrapper around ClientConfig with file I/O)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
}

/// Values given on the command line; each one wins over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
    pub timeout: Option<u64>,
}

impl CliConfig {
    /// Load CLI configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load CLI configuration from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI configuration {}", path.display()))?;

        let config: Self =
            toml::from_str(&contents).context("Failed to parse CLI configuration")?;

        Ok(config)
    }

    /// Get the path to the CLI configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("desktop-remote").join("client.toml"))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.client.host = host;
        }
        if let Some(port) = overrides.port {
            self.client.port = port;
        }
        if let Some(token) = overrides.token {
            self.client.auth_token = token;
        }
        if let Some(timeout) = overrides.timeout {
            self.client.request_timeout_secs = timeout;
        }
        self
    }
}
