// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `gemtalk.toml` loading.
//!
//! The file is looked up in this order:
//! 1. `--config <path>` (must exist)
//! 2. `gemtalk.toml` in the current directory or the nearest parent holding one
//! 3. `~/.config/gemtalk/gemtalk.toml` (platform config dir)
//!
//! Without any file the defaults apply.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use gemtalk_core::refactor::RefactorSettings;
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "gemtalk.toml";

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

/// Parsed `gemtalk.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub refactor: RefactorSettings,
    pub output: OutputSettings,
}

impl Config {
    /// Parses a config file.
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config '{path}'"))?;
        toml::from_str(&content)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to parse config '{path}'"))
    }
}

/// Loads the config for a run started in `cwd`.
pub fn load(explicit: Option<&Utf8Path>, cwd: &Utf8Path) -> Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover(cwd).or_else(user_config_path),
    };
    match path {
        Some(path) => {
            debug!(%path, "Loading config");
            Config::from_file(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Walks up from `start` looking for `gemtalk.toml`.
pub fn discover(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn user_config_path() -> Option<Utf8PathBuf> {
    let dir = dirs::config_dir()?;
    let path = Utf8PathBuf::from_path_buf(dir.join("gemtalk").join(CONFIG_FILE_NAME)).ok()?;
    path.is_file().then_some(path)
}
