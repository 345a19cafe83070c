use anyhow::{Context, Result};
use directories::ProjectDirs;
use repo_lookup_core::{ExecutionMode, FailurePolicy, LookupOptions, Scope, DEFAULT_MAX_WORKERS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    /// Catalog file listing the servers to query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct LookupConfig {
    pub scope: Scope,
    pub max_workers: usize,
    pub failure_policy: FailurePolicy,
    pub sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            catalog: None,
            lookup: LookupConfig::default(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            scope: Scope::Repository,
            max_workers: DEFAULT_MAX_WORKERS,
            failure_policy: FailurePolicy::FailFast,
            sync: false,
        }
    }
}

impl LookupConfig {
    pub fn options(&self) -> LookupOptions {
        LookupOptions::default()
            .with_max_workers(self.max_workers)
            .with_failure_policy(self.failure_policy)
    }

    pub fn mode(&self) -> ExecutionMode {
        if self.sync {
            ExecutionMode::Sync
        } else {
            ExecutionMode::Async
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "repo-lookup")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("repo-lookup.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            // Create directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: &CliArgs, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        // CLI args override config file
        config.apply_cli(cli_args);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli_args: &CliArgs) {
        if let Some(catalog) = &cli_args.catalog {
            self.catalog = Some(catalog.clone());
        }
        if let Some(scope) = cli_args.scope {
            self.lookup.scope = scope;
        }
        if let Some(max_workers) = cli_args.max_workers {
            self.lookup.max_workers = max_workers;
        }
        if cli_args.sync {
            self.lookup.sync = true;
        }
        if cli_args.best_effort {
            self.lookup.failure_policy = FailurePolicy::BestEffort;
        }
    }
}
