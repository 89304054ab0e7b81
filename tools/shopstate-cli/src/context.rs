//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use shopstate_core::Storefront;
use shopstate_kv::Cache;

use crate::config::{CliConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    data_dir_override: Option<String>,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, data_dir: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd)? {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        if let Some(path) = &config_path {
            output.debug(&format!("Using config: {}", path.display()));
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
            data_dir_override: data_dir.map(str::to_string),
        })
    }

    /// Find config file in directory tree.
    ///
    /// A file that exists but does not parse is an error rather than being
    /// skipped.
    fn find_config(start: &Path) -> Result<Option<(CliConfig, PathBuf)>> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.is_file() {
                    let config = CliConfig::load(&config_path.to_string_lossy())?;
                    return Ok(Some((config, config_path)));
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Directory holding the persisted records.
    pub fn data_dir(&self) -> PathBuf {
        let dir = self
            .data_dir_override
            .as_deref()
            .unwrap_or(&self.config.store.data_dir);
        self.resolve_path(dir)
    }

    /// Open the file-backed storefront.
    pub fn open_store(&self) -> Result<Storefront> {
        let dir = self.data_dir();
        let mut cache = Cache::open(&dir)
            .with_context(|| format!("Failed to open data directory: {}", dir.display()))?;
        if let Some(namespace) = &self.config.store.namespace {
            cache = cache.namespaced(namespace);
        }
        self.output.debug(&format!("Data directory: {}", dir.display()));

        Storefront::open(self.config.engine.clone(), &cache).context("Invalid engine configuration")
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
