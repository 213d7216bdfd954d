//! Configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use windnodes_core::{Categorization, DatasetFormat};
use windnodes_plot::SvgOptions;

use crate::Args;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub categories: Categorization,
    #[serde(default)]
    pub render: SvgOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the node dataset
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
    /// Encoding of the dataset (guessed from the extension when absent)
    #[serde(default)]
    pub format: Option<DatasetFormat>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            format: None,
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("./nodes.pkl")
}

impl DatasetConfig {
    pub fn resolved_format(&self) -> DatasetFormat {
        self.format
            .unwrap_or_else(|| DatasetFormat::from_path(&self.path))
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Let command-line flags take precedence over the file
pub fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.dataset {
        config.dataset.path = path.clone();
    }
    if let Some(format) = args.format {
        config.dataset.format = Some(format.into());
    }
    if let Some(dir) = &args.output_dir {
        config.render.output_dir = dir.clone();
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
