//! Config-file reloading for `server --reload`.

use crate::agent::AgentRegistry;
use crate::cli::Args;
use crate::config::Config;
use crate::server::AppState;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Watches a config file by modification time.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_modified = modified(&path);
        Self {
            path,
            last_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the freshly loaded config if the file changed since the last poll.
    ///
    /// A file that disappeared is ignored until it comes back.
    pub fn poll(&mut self) -> Option<Result<Config>> {
        let current = modified(&self.path);
        if current == self.last_modified {
            return None;
        }
        self.last_modified = current;

        if current.is_none() {
            return None;
        }
        Some(Config::load(&self.path))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the config file and swap in a rebuilt registry when it changes.
pub fn spawn_reloader(
    mut watcher: ConfigWatcher,
    state: AppState,
    args: Args,
    every: Duration,
) -> JoinHandle<()> {
    info!("Watching {} for changes", watcher.path().display());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            match watcher.poll() {
                None => {}
                Some(Ok(mut config)) => {
                    config.merge_with_args(&args);
                    match AgentRegistry::from_config(&config.model) {
                        Ok(registry) => {
                            info!(
                                "Reloaded configuration (model {}, runtime {})",
                                config.model.name, config.model.runtime_url
                            );
                            state.replace_registry(registry).await;
                        }
                        Err(e) => warn!("Keeping previous agents: {}", e),
                    }
                }
                Some(Err(e)) => warn!("Keeping previous configuration: {:#}", e),
            }

            debug!("Config poll complete");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn bump_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_poll_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bizagent.toml");
        std::fs::write(&path, "[model]\nname = \"first\"\n").unwrap();

        let mut watcher = ConfigWatcher::new(path.clone());
        assert!(watcher.poll().is_none());

        std::fs::write(&path, "[model]\nname = \"second\"\n").unwrap();
        bump_mtime(&path, 10);

        let config = watcher.poll().unwrap().unwrap();
        assert_eq!(config.model.name, "second");
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_poll_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bizagent.toml");
        std::fs::write(&path, "[server]\nport = 8000\n").unwrap();

        let mut watcher = ConfigWatcher::new(path.clone());
        std::fs::write(&path, "[server\nport = ").unwrap();
        bump_mtime(&path, 20);

        assert!(watcher.poll().unwrap().is_err());
    }

    #[test]
    fn test_poll_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let mut watcher = ConfigWatcher::new(path.clone());
        assert!(watcher.poll().is_none());

        std::fs::write(&path, "[model]\nname = \"late\"\n").unwrap();
        let config = watcher.poll().unwrap().unwrap();
        assert_eq!(config.model.name, "late");

        std::fs::remove_file(&path).unwrap();
        assert!(watcher.poll().is_none());
    }
}
