//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use market_cart::{CartContext, CartStore};
use market_kv::FileStore;

use crate::config::{default_data_dir, CliConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the config was loaded from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match find_config(&cwd) {
                Some(path) => {
                    let config = CliConfig::load(&path.to_string_lossy())?;
                    (config, Some(path))
                }
                None => (CliConfig::default(), None),
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Directory the cart's key-value files live in.
    pub fn data_dir(&self) -> PathBuf {
        match self.config.storage.data_dir {
            Some(ref dir) => self.resolve_path(dir),
            None => default_data_dir(),
        }
    }

    /// Open the file store, load the cart, and provide it to a fresh scope.
    pub async fn cart_scope(&self) -> Result<CartContext> {
        let dir = self.data_dir();
        self.output
            .debug(&format!("Using cart data in {}", dir.display()));

        let store = FileStore::open(&dir)
            .await
            .with_context(|| format!("Failed to open cart storage at {}", dir.display()))?;
        let cart = CartStore::load(store, self.config.cart.clone())
            .await
            .context("Failed to load cart")?;

        Ok(CartContext::with_store(cart))
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

/// Find a config file in the directory tree.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.is_file() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
