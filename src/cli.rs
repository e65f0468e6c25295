//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::deploy::DeployEnvironment;
use crate::models::AnalysisKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BizAgent - business-intelligence agents backed by a hosted LLM
///
/// Serve market, risk, KYC, competitive, financial and customer-insight
/// agents over HTTP, deploy their infrastructure, or validate a business
/// concept straight from the terminal.
///
/// Examples:
///   bizagent server --port 8000 --reload
///   bizagent deploy --environment staging
///   bizagent validate "Subscription coffee for offices" --market Germany
///   bizagent validate "Peer-to-peer EV charging" --scope market --scope risk --format json
///   bizagent init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .bizagent.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Model used by the agent runtime
    #[arg(long, global = true, env = "BIZAGENT_MODEL")]
    pub model: Option<String>,

    /// Agent runtime base URL
    #[arg(long, global = true, value_name = "URL", env = "BIZAGENT_RUNTIME_URL")]
    pub runtime_url: Option<String>,

    /// Agent runtime request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server hosting the agents
    Server {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Reload configuration when the config file changes
        #[arg(long)]
        reload: bool,
    },

    /// Deploy the infrastructure stack
    Deploy {
        /// Target environment
        #[arg(short, long, value_enum)]
        environment: DeployEnvironment,

        /// Print the deploy command without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a business concept with the agents
    Validate {
        /// The business concept to validate
        concept: String,

        /// Target market for the concept
        #[arg(short, long)]
        market: Option<String>,

        /// Analyses to run (repeatable)
        ///
        /// Defaults to market, competitive and risk.
        #[arg(short, long = "scope", value_enum, value_name = "KIND")]
        scope: Vec<AnalysisKind>,

        /// Scenario framing for the analysis
        #[arg(long)]
        scenario: Option<String>,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the prompts without calling the runtime
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a default .bizagent.toml configuration file
    InitConfig,
}

/// Output format for the validation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Scopes run by `validate` when none are given.
pub const DEFAULT_SCOPES: [AnalysisKind; 3] = [
    AnalysisKind::Market,
    AnalysisKind::Competitive,
    AnalysisKind::Risk,
];

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.runtime_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Runtime URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        match self.command {
            Command::Server { port: Some(0), .. } => {
                return Err("Port must be between 1 and 65535".to_string());
            }
            Command::Validate { ref concept, .. } if concept.trim().is_empty() => {
                return Err("Business concept must not be empty".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Deduplicate requested scopes, keeping their order, or fall back to the defaults.
pub fn effective_scopes(requested: &[AnalysisKind]) -> Vec<AnalysisKind> {
    if requested.is_empty() {
        return DEFAULT_SCOPES.to_vec();
    }

    let mut scopes = Vec::with_capacity(requested.len());
    for kind in requested {
        if !scopes.contains(kind) {
            scopes.push(*kind);
        }
    }
    scopes
}
