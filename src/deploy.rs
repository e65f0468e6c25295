//! Infrastructure deployment.
//!
//! Deploys are delegated to an external infrastructure-as-code tool
//! (AWS CDK by default) run as a subprocess.

use crate::config::DeployConfig;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeployEnvironment {
    Development,
    Staging,
    Production,
}

impl fmt::Display for DeployEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployEnvironment::Development => write!(f, "development"),
            DeployEnvironment::Staging => write!(f, "staging"),
            DeployEnvironment::Production => write!(f, "production"),
        }
    }
}

/// Errors raised while deploying.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("'{tool}' was not found on PATH. Install it first (e.g. `npm install -g aws-cdk`).")]
    ToolNotFound { tool: String },

    #[error("Infrastructure directory does not exist: {0}")]
    MissingWorkingDir(PathBuf),

    #[error("Failed to launch '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Deploy failed with exit code {0}")]
    Failed(i32),

    #[error("Deploy was terminated by a signal")]
    Terminated,
}

/// A fully resolved deploy command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub environment: DeployEnvironment,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl DeployPlan {
    /// Build the deploy command for an environment.
    pub fn new(config: &DeployConfig, environment: DeployEnvironment) -> Self {
        let approval = if environment == DeployEnvironment::Production
            && config.require_approval_in_production
        {
            "broadening"
        } else {
            "never"
        };

        let args = vec![
            "deploy".to_string(),
            config.stack.clone(),
            "--context".to_string(),
            format!("environment={}", environment),
            "--require-approval".to_string(),
            approval.to_string(),
        ];

        Self {
            environment,
            program: config.tool.clone(),
            args,
            working_dir: config.working_dir.clone(),
        }
    }

    /// The command line as it would be typed in a shell.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run the deploy, inheriting stdio.
    pub async fn run(&self) -> Result<(), DeployError> {
        let program = locate_tool(&self.program, std::env::var_os("PATH"))?;

        if !self.working_dir.is_dir() {
            return Err(DeployError::MissingWorkingDir(self.working_dir.clone()));
        }

        info!(
            "Deploying to {} from {}: {}",
            self.environment,
            self.working_dir.display(),
            self.command_line()
        );

        let status = tokio::process::Command::new(&program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .status()
            .await
            .map_err(|source| DeployError::Spawn {
                tool: self.program.clone(),
                source,
            })?;

        debug!("Deploy exited with {}", status);

        if status.success() {
            Ok(())
        } else {
            match status.code() {
                Some(code) => Err(DeployError::Failed(code)),
                None => Err(DeployError::Terminated),
            }
        }
    }
}

/// Locate an executable in `search_path`, falling back to the tool name as given
/// when it already contains a path separator.
pub fn locate_tool(program: &str, search_path: Option<OsString>) -> Result<PathBuf, DeployError> {
    which::which_in(program, search_path, ".").map_err(|_| DeployError::ToolNotFound {
        tool: program.to_string(),
    })
}

/// Process exit code for a finished deploy.
pub fn exit_code(outcome: &Result<(), DeployError>) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_for_development() {
        let plan = DeployPlan::new(&DeployConfig::default(), DeployEnvironment::Development);
        assert_eq!(plan.program, "cdk");
        assert_eq!(plan.working_dir, PathBuf::from("infrastructure"));
        assert_eq!(
            plan.command_line(),
            "cdk deploy --all --context environment=development --require-approval never"
        );
    }

    #[test]
    fn test_plan_for_production_requires_approval() {
        let plan = DeployPlan::new(&DeployConfig::default(), DeployEnvironment::Production);
        assert!(plan.args.ends_with(&["--require-approval".to_string(), "broadening".to_string()]));

        let config = DeployConfig {
            require_approval_in_production: false,
            ..DeployConfig::default()
        };
        let plan = DeployPlan::new(&config, DeployEnvironment::Production);
        assert_eq!(plan.args.last().map(String::as_str), Some("never"));
    }

    #[test]
    fn test_plan_uses_configured_stack() {
        let config = DeployConfig {
            stack: "BizAgentStack".to_string(),
            ..DeployConfig::default()
        };
        let plan = DeployPlan::new(&config, DeployEnvironment::Staging);
        assert_eq!(plan.args[1], "BizAgentStack");
        assert!(plan.args.contains(&"environment=staging".to_string()));
    }

    #[cfg(unix)]
    fn write_tool(dir: &std::path::Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let tool = dir.join(name);
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(mode)).unwrap();
        tool
    }

    #[test]
    fn test_locate_tool_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_tool(
            "bizagent-definitely-not-installed-tool",
            Some(dir.path().as_os_str().to_os_string()),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::ToolNotFound { ref tool } if tool == "bizagent-definitely-not-installed-tool"));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_tool_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = write_tool(dir.path(), "fake-cdk", 0o755);
        let found = locate_tool(tool.to_str().unwrap(), None).unwrap();
        assert_eq!(found.canonicalize().unwrap(), tool.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_tool_skips_non_executable_files() {
        let shadow = tempfile::tempdir().unwrap();
        let real = tempfile::tempdir().unwrap();
        write_tool(shadow.path(), "fake-cdk", 0o644);
        let expected = write_tool(real.path(), "fake-cdk", 0o755);

        let search_path = std::env::join_paths([shadow.path(), real.path()]).unwrap();
        let found = locate_tool("fake-cdk", Some(search_path)).unwrap();
        assert_eq!(found.canonicalize().unwrap(), expected.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_tool_rejects_only_non_executable_match() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(dir.path(), "fake-cdk", 0o644);
        assert!(locate_tool("fake-cdk", Some(dir.path().as_os_str().to_os_string())).is_err());
    }

    #[tokio::test]
    async fn test_run_reports_missing_tool() {
        let config = DeployConfig {
            tool: "bizagent-definitely-not-installed-tool".to_string(),
            ..DeployConfig::default()
        };
        let plan = DeployPlan::new(&config, DeployEnvironment::Development);
        assert!(matches!(
            plan.run().await,
            Err(DeployError::ToolNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_missing_working_dir() {
        let config = DeployConfig {
            tool: "sh".to_string(),
            working_dir: PathBuf::from("/nonexistent/bizagent/infrastructure"),
            ..DeployConfig::default()
        };
        let plan = DeployPlan::new(&config, DeployEnvironment::Staging);
        assert!(matches!(
            plan.run().await,
            Err(DeployError::MissingWorkingDir(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_propagates_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig {
            tool: "sh".to_string(),
            working_dir: dir.path().to_path_buf(),
            ..DeployConfig::default()
        };
        let mut plan = DeployPlan::new(&config, DeployEnvironment::Development);
        plan.args = vec!["-c".to_string(), "exit 3".to_string()];
        let outcome = plan.run().await;
        assert!(matches!(outcome, Err(DeployError::Failed(3))));
        assert_eq!(exit_code(&outcome), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig {
            tool: "sh".to_string(),
            working_dir: dir.path().to_path_buf(),
            ..DeployConfig::default()
        };
        let mut plan = DeployPlan::new(&config, DeployEnvironment::Production);
        plan.args = vec!["-c".to_string(), "exit 0".to_string()];
        assert_eq!(exit_code(&plan.run().await), 0);
    }

    #[test]
    fn test_exit_code_for_every_failure() {
        let failures = [
            DeployError::ToolNotFound {
                tool: "cdk".to_string(),
            },
            DeployError::MissingWorkingDir(PathBuf::from("infrastructure")),
            DeployError::Failed(2),
            DeployError::Terminated,
        ];
        for failure in failures {
            assert_eq!(exit_code(&Err(failure)), 1);
        }
        assert_eq!(exit_code(&Ok(())), 0);
    }
}
