// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

use crate::db::APP;

pub const API_KEY_ENV: &str = "TRIPLOG_API_KEY";
pub const DEFAULT_BASE_URL: &str =
    "https://www.koreaexim.go.kr/site/program/financial/exchangeJSON";
pub const DEFAULT_HOME_CURRENCY: &str = "KRW";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_home_currency() -> String {
    DEFAULT_HOME_CURRENCY.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Rate provider key. Rate fetches refuse to run without one.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: None,
            base_url: default_base_url(),
            home_currency: default_home_currency(),
        }
    }
}

impl AppConfig {
    /// Reads `config.json` from the platform config dir if present, then
    /// applies the environment override for the API key.
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path()?;
        let config = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            AppConfig::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
            .context("Could not determine project directories")?;
        Ok(proj.config_dir().join("config.json"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.home_currency = config.home_currency.trim().to_uppercase();
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }
        self
    }

    /// The configured key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
