//! Configuration loading from `build-cleaner.toml` and `BUILDCLEANER_*` variables.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::exclusions::RuleFaultPolicy;
use crate::locator::{executable_directory, RootAnchor};

/// File name looked up beside the executable.
pub const CONFIG_FILE_NAME: &str = "build-cleaner.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BUILDCLEANER_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// What the root `.` refers to
    pub root_anchor: RootAnchor,
    pub exclude: ExcludeConfig,
    pub folders: FoldersConfig,
}

/// Which exclusion rules are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludeConfig {
    pub ancestor_path: bool,
    pub symbolic_links: bool,
    pub dot_folders: bool,
    pub hidden_folders: bool,
    /// Folder names pruned wherever they appear
    pub subtrees: Vec<String>,
    /// Globs matched against full folder paths
    pub globs: Vec<String>,
    pub on_rule_error: RuleFaultPolicy,
}

impl Default for ExcludeConfig {
    fn default() -> Self {
        Self {
            ancestor_path: true,
            symbolic_links: true,
            dot_folders: true,
            hidden_folders: false,
            subtrees: vec![".git".to_string(), "node_modules".to_string()],
            globs: Vec::new(),
            on_rule_error: RuleFaultPolicy::default(),
        }
    }
}

/// What counts as a build folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldersConfig {
    pub targets: Vec<String>,
    /// Globs for the project file that must sit beside a target
    pub project_files: Vec<String>,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            targets: vec!["bin".into(), "obj".into(), "testresults".into()],
            project_files: vec!["*.csproj".into()],
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration TOML")
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit path must exist. Otherwise `BUILDCLEANER_CONFIG` is used if
    /// set, then `build-cleaner.toml` beside the executable if present, then the
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match locate(explicit)? {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read configuration {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("Invalid configuration in {}", path.display()))?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(std::env::vars())?;
        Ok(config)
    }

    /// Apply `BUILDCLEANER_*` overrides from `vars`.
    pub fn apply_env_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();

            match name {
                "ROOT_ANCHOR" => self.root_anchor = parse_env(name, value)?,
                "ANCESTOR_PATH" => self.exclude.ancestor_path = parse_bool(name, value)?,
                "SYMBOLIC_LINKS" => self.exclude.symbolic_links = parse_bool(name, value)?,
                "DOT_FOLDERS" => self.exclude.dot_folders = parse_bool(name, value)?,
                "HIDDEN_FOLDERS" => self.exclude.hidden_folders = parse_bool(name, value)?,
                "SUBTREES" => self.exclude.subtrees = parse_list(value),
                "GLOBS" => self.exclude.globs = parse_list(value),
                "ON_RULE_ERROR" => self.exclude.on_rule_error = parse_env(name, value)?,
                "TARGETS" => self.folders.targets = parse_list(value),
                "PROJECT_FILES" => self.folders.project_files = parse_list(value),
                // Handled by `load` / logging setup
                "CONFIG" | "LOG" => {}
                other => debug!("Ignoring unknown variable {}{}", ENV_PREFIX, other),
            }
        }

        Ok(())
    }
}

fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Configuration file '{}' does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(path) = std::env::var_os(format!("{}CONFIG", ENV_PREFIX)) {
        let path = PathBuf::from(path);
        if !path.is_file() {
            bail!(
                "Configuration file '{}' from {}CONFIG does not exist",
                path.display(),
                ENV_PREFIX
            );
        }
        return Ok(Some(path));
    }

    // Beside the executable, optional
    Ok(executable_directory()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file()))
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|err: String| anyhow::anyhow!("{}{}: {}", ENV_PREFIX, name, err))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{}{}: expected a boolean, got '{}'", ENV_PREFIX, name, other),
    }
}

/// Comma separated, blanks dropped.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
