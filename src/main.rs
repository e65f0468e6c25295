//! BizAgent - business-intelligence agents backed by a hosted LLM
//!
//! A CLI that serves market, risk, KYC, competitive, financial and
//! customer-insight agents over HTTP, deploys their infrastructure,
//! and validates business concepts from the terminal.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Handled failure (bad arguments, missing tool, failed deploy,
//!       or an analysis that fell back)

mod agent;
mod cli;
mod config;
mod deploy;
mod models;
mod prompts;
mod report;
mod server;
mod validate;

use agent::AgentRegistry;
use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use deploy::{DeployEnvironment, DeployPlan};
use models::AnalysisKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use validate::ValidationRequest;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("BizAgent v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match dispatch(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .bizagent.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your agent runtime and infrastructure.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` takes precedence.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the selected command. Returns the process exit code.
async fn dispatch(args: Args) -> Result<i32> {
    let (mut config, config_path) = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command.clone() {
        Command::Server { reload, .. } => {
            server::serve(config, args, config_path, reload).await?;
            Ok(0)
        }
        Command::Deploy {
            environment,
            dry_run,
        } => handle_deploy(&config, environment, dry_run).await,
        Command::Validate {
            concept,
            market,
            scope,
            scenario,
            format,
            output,
            dry_run,
        } => {
            let request = ValidationRequest {
                concept,
                market,
                scenario,
                scopes: cli::effective_scopes(&scope),
            };
            handle_validate(&config, &args, request, format, output, dry_run).await
        }
        Command::InitConfig => {
            handle_init_config()?;
            Ok(0)
        }
    }
}

/// Deploy the infrastructure stack for an environment.
async fn handle_deploy(config: &Config, environment: DeployEnvironment, dry_run: bool) -> Result<i32> {
    let plan = DeployPlan::new(&config.deploy, environment);

    if dry_run {
        println!("🔍 Dry run: would run in {}:", plan.working_dir.display());
        println!("   {}", plan.command_line());
        return Ok(0);
    }

    println!("🚀 Deploying to {}...", environment);

    let outcome = plan.run().await;
    match &outcome {
        Ok(()) => println!("\n✅ Deployment to {} complete.", environment),
        Err(e) => {
            error!("Deploy failed: {}", e);
            eprintln!("\n❌ {}", e);
        }
    }

    Ok(deploy::exit_code(&outcome))
}

/// Validate a business concept with the selected agents.
async fn handle_validate(
    config: &Config,
    args: &Args,
    request: ValidationRequest,
    format: OutputFormat,
    output: Option<PathBuf>,
    dry_run: bool,
) -> Result<i32> {
    let registry = AgentRegistry::from_config(&config.model)
        .context("Failed to initialize agent runtime client")?;

    if dry_run {
        println!("🔍 Dry run: prompts that would be sent (no runtime calls)...\n");
        println!("{}", validate::render_prompts(&registry, &request)?);
        return Ok(0);
    }

    if !args.quiet {
        let scopes: Vec<&str> = request.scopes.iter().map(AnalysisKind::as_str).collect();
        eprintln!("🤖 Validating \"{}\"", request.concept);
        eprintln!("   Model: {}", config.model.name);
        eprintln!("   Runtime: {}", config.model.runtime_url);
        eprintln!("   Scopes: {}\n", scopes.join(", "));
    }

    let report = validate::run_validation(&registry, &request, !args.quiet).await;

    let rendered = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("✅ Report saved to: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if report.summary.fell_back > 0 {
        eprintln!(
            "\n⚠️  {} of {} analyses fell back. See the report for details.",
            report.summary.fell_back, report.summary.total
        );
    }

    Ok(validate::exit_code(&report.summary))
}

/// Load configuration from file or use defaults.
///
/// Also returns the path of the file that was loaded, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME))))
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok((Config::default(), Some(PathBuf::from(CONFIG_FILE_NAME))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_deploy_dry_run_exits_zero() {
        let config = Config::default();
        let code = handle_deploy(&config, DeployEnvironment::Staging, true)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_deploy_missing_tool_exits_one() {
        let mut config = Config::default();
        config.deploy.tool = "bizagent-definitely-not-installed-tool".to_string();
        let code = handle_deploy(&config, DeployEnvironment::Development, false)
            .await
            .unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_validate_with_unreachable_runtime_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let mut config = Config::default();
        config.model.runtime_url = "http://127.0.0.1:1".to_string();
        config.model.timeout_seconds = 5;

        let args = Args::parse_from(["bizagent", "--quiet", "validate", "Drone deliveries"]);
        let request = ValidationRequest {
            concept: "Drone deliveries".to_string(),
            market: None,
            scenario: None,
            scopes: vec![AnalysisKind::Market],
        };

        let code = handle_validate(
            &config,
            &args,
            request,
            OutputFormat::Json,
            Some(output.clone()),
            false,
        )
        .await
        .unwrap();
        assert_eq!(code, 1);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(report["summary"]["fell_back"], 1);
    }

    #[tokio::test]
    async fn test_validate_dry_run_exits_zero() {
        let args = Args::parse_from(["bizagent", "validate", "Drone deliveries"]);
        let request = ValidationRequest {
            concept: "Drone deliveries".to_string(),
            market: None,
            scenario: None,
            scopes: cli::DEFAULT_SCOPES.to_vec(),
        };

        let code = handle_validate(
            &Config::default(),
            &args,
            request,
            OutputFormat::Markdown,
            None,
            true,
        )
        .await
        .unwrap();
        assert_eq!(code, 0);
    }
}
