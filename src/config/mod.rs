//! Configuration loading for OnClass Analyzer

mod schema;

pub use schema::{Config, LexiconConfig, Limits, LimitsConfig, DEFAULT_MIN_KEYWORD_OCCURRENCES};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILENAME: &str = ".onclassrc.json";

/// Find and load config file with extends resolution. Searches current directory then parents.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config_with_extends(&path, &mut HashSet::new())
        }
        None => Ok(Config::default()),
    }
}

/// Load a config file and resolve extends chain
fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !visited.insert(canonical) {
        anyhow::bail!(
            "Circular extends detected in config: {}",
            config_path.display()
        );
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", config_path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_config = resolve_extends(config_path, &extends, visited)?;
        config.merge_from(base_config);
    }

    Ok(config)
}

/// Resolve an extends reference relative to the referencing config
fn resolve_extends(
    config_path: &Path,
    extends: &str,
    visited: &mut HashSet<PathBuf>,
) -> Result<Config> {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));

    let extends_path = if Path::new(extends).is_absolute() {
        PathBuf::from(extends)
    } else {
        config_dir.join(extends)
    };

    // Ensure it has .json extension
    let extends_path = if extends_path.extension().is_none() {
        extends_path.with_extension("json")
    } else {
        extends_path
    };

    if !extends_path.exists() {
        anyhow::bail!(
            "Extended config not found: {} (referenced from {})",
            extends_path.display(),
            config_path.display()
        );
    }

    load_config_with_extends(&extends_path, visited)
}

/// Search for .onclassrc.json in directory and its parents
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.exists())
}

/// Starter config written by `onclass init`
pub fn starter_config(filter: Option<&str>, threshold: Option<i32>) -> Config {
    Config {
        filter: Some(filter.unwrap_or("all").to_string()),
        threshold: Some(threshold.unwrap_or(0)),
        min_keyword_occurrences: Some(DEFAULT_MIN_KEYWORD_OCCURRENCES),
        ..Config::default()
    }
}

/// Write a starter config into `dir`. Refuses to overwrite an existing file.
pub fn write_starter_config(dir: &Path, config: &Config) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&path, json + "\n")
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(path)
}
