use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};

use crate::config::{Config, EnvSnapshot, GlobalOptions};

/// Per-invocation state shared by every operation: global CLI options, an
/// environment snapshot, derived configuration, and the lazily resolved
/// working directory.
pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    env: EnvSnapshot,
    config: Config,
    working_dir: OnceLock<PathBuf>,
}

impl<'a> CommandContext<'a> {
    #[must_use]
    pub fn new(global: &'a GlobalOptions) -> Self {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env);
        Self {
            global,
            env,
            config,
            working_dir: OnceLock::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn testing(global: &'a GlobalOptions, env: EnvSnapshot) -> Self {
        let config = Config::from_snapshot(&env);
        Self {
            global,
            env,
            config,
            working_dir: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env_flag_enabled(&self, key: &str) -> bool {
        self.env.flag_is_enabled(key)
    }

    /// Resolves the invocation's working directory, caching the answer.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined.
    pub fn working_dir(&self) -> Result<PathBuf> {
        if let Some(path) = self.working_dir.get() {
            Ok(path.clone())
        } else {
            let path =
                env::current_dir().context("failed to determine the working directory")?;
            let _ = self.working_dir.set(path.clone());
            Ok(path)
        }
    }
}
