// Config discovery and input loading for the CLI commands.

use std::path::{Path, PathBuf};

use claimgrid_io::{csv, xlsx};
use claimgrid_pipeline::{PipelineConfig, Table};

use crate::CliError;

/// File name looked up under the user config dir when `--config` is absent.
pub const CONFIG_FILE: &str = "pipeline.toml";

/// `<config_dir>/claimgrid/pipeline.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("claimgrid").join(CONFIG_FILE))
}

/// Where the effective config came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    UserDefault(PathBuf),
    BuiltIn,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(p) | Self::UserDefault(p) => write!(f, "{}", p.display()),
            Self::BuiltIn => write!(f, "built-in defaults"),
        }
    }
}

/// Resolve the pipeline config: the explicit path, else the user default
/// file when present, else the built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<(PipelineConfig, ConfigSource), CliError> {
    let source = match explicit {
        Some(p) => ConfigSource::Explicit(p.to_path_buf()),
        None => match default_config_path() {
            Some(p) if p.is_file() => ConfigSource::UserDefault(p),
            _ => ConfigSource::BuiltIn,
        },
    };

    let config = match &source {
        ConfigSource::Explicit(p) | ConfigSource::UserDefault(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| CliError::config(format!("cannot read config {}: {}", p.display(), e)))?;
            PipelineConfig::from_toml(&text).map_err(|e| {
                CliError::config(format!("{}: {}", p.display(), e))
                    .with_hint("run `claimgrid config` to print a valid config".to_string())
            })?
        }
        ConfigSource::BuiltIn => PipelineConfig::default(),
    };

    log::debug!("config: {}", source);
    Ok((config, source))
}

/// True for extensions read as delimited text rather than as a workbook.
fn is_delimited(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("csv" | "tsv" | "txt")
    )
}

/// Load a delimited export (SC or Benefit).
pub fn load_csv(path: &Path) -> Result<Table, CliError> {
    if !path.exists() {
        return Err(CliError::input(format!("file not found: {}", path.display())));
    }
    let table = if path.extension().and_then(|e| e.to_str()) == Some("tsv") {
        csv::import_with_delimiter(path, b'\t')
    } else {
        csv::import(path)
    };
    table.map_err(CliError::input)
}

/// Load the CR policy summary: a workbook sheet, or a delimited export.
pub fn load_summary(path: &Path, sheet: Option<&str>) -> Result<Table, CliError> {
    if !path.exists() {
        return Err(CliError::input(format!("file not found: {}", path.display())));
    }
    if is_delimited(path) {
        if sheet.is_some() {
            log::warn!("--cr-sheet ignored for delimited file {}", path.display());
        }
        return load_csv(path);
    }
    xlsx::import(path, sheet).map_err(CliError::input)
}
