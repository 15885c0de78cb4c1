//! Workflow store configuration.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Location of the file-backed workflow store.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct StoreConfig {
    /// Directory holding one JSON file per stored workflow.
    ///
    /// Created on first save.
    #[arg(long, env = "AGENTRY_STORE_DIR", default_value = ".agentry")]
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

impl StoreConfig {
    /// Validates the store configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store_dir.as_os_str().is_empty() {
            anyhow::bail!("store directory must not be empty");
        }

        if self.store_dir.is_file() {
            anyhow::bail!(
                "store directory '{}' exists and is not a directory",
                self.store_dir.display()
            );
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".agentry")
}
