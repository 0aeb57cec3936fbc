use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Indent unit used by the unparser when nothing else is configured.
pub const DEFAULT_INDENT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BachConfig {
    pub indent: Option<usize>,
    pub format: Option<OutputFormat>,
    pub annotate: Option<bool>,
}

impl BachConfig {
    /// The configuration `init` writes.
    pub fn starter() -> Self {
        Self {
            indent: Some(DEFAULT_INDENT),
            format: Some(OutputFormat::Human),
            annotate: Some(false),
        }
    }

    pub fn indent(&self) -> usize {
        self.indent.unwrap_or(DEFAULT_INDENT)
    }

    pub fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    pub fn annotate(&self) -> bool {
        self.annotate.unwrap_or(false)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("bach.toml")
}

/// Load the config.
///
/// An explicit path must exist. Without one, `bach.toml` in the working
/// directory is optional and `None` means defaults apply.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BachConfig>> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} not found (given with --config)", path.display());
            }
            read_config(path).map(Some)
        }
        None => {
            let path = default_config_path();
            if !path.exists() {
                tracing::debug!("no {} found, using defaults", path.display());
                return Ok(None);
            }
            read_config(&path).map(Some)
        }
    }
}

fn read_config(path: &Path) -> anyhow::Result<BachConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: BachConfig = toml::from_str(&contents)
        .with_context(|| format!("invalid config in {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

pub fn write_config(path: &Path, config: &BachConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
