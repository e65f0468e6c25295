//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bizagent.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".bizagent.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Agent runtime settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Infrastructure deploy settings.
    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Hosted model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name sent to the runtime.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the agent runtime.
    #[serde(default = "default_runtime_url")]
    pub runtime_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default)]
    pub max_tokens: Option<usize>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Environment variable holding an optional bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            runtime_url: default_runtime_url(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_seconds: default_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_runtime_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout() -> u64 {
    120
}

fn default_api_key_env() -> String {
    "BIZAGENT_API_KEY".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// How often `--reload` checks the config file, in milliseconds.
    #[serde(default = "default_reload_interval")]
    pub reload_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reload_interval_ms: default_reload_interval(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_reload_interval() -> u64 {
    1000
}

/// Infrastructure deploy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Deploy tool executable.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Directory holding the infrastructure app.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Stack selector passed to the tool.
    #[serde(default = "default_stack")]
    pub stack: String,

    /// Ask for approval of security-broadening changes in production.
    #[serde(default = "default_true")]
    pub require_approval_in_production: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            working_dir: default_working_dir(),
            stack: default_stack(),
            require_approval_in_production: true,
        }
    }
}

fn default_tool() -> String {
    "cdk".to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("infrastructure")
}

fn default_stack() -> String {
    "--all".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Reject settings the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.model.timeout_seconds == 0 {
            bail!("model.timeout_seconds must be greater than 0");
        }
        Ok(())
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.runtime_url {
            self.model.runtime_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let crate::cli::Command::Server { ref host, port, .. } = args.command {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = port;
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
