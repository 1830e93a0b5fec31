//! Configuration Management
//!
//! Handles persistent configuration storage for mohua.

use crate::retry::RetryConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Region to query
    #[serde(default)]
    pub region: Option<String>,
    /// AWS profile for credentials
    #[serde(default)]
    pub profile: Option<String>,
    /// SageMaker endpoint override
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Retry policy overrides
    #[serde(default)]
    pub retry: RetryOverrides,
}

/// Partial retry settings layered over the default policy
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RetryOverrides {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub initial_backoff_ms: Option<u64>,
    #[serde(default)]
    pub max_backoff_ms: Option<u64>,
}

impl RetryOverrides {
    pub fn is_empty(&self) -> bool {
        self.max_attempts.is_none()
            && self.initial_backoff_ms.is_none()
            && self.max_backoff_ms.is_none()
    }

    /// Apply over the default policy, rejecting combinations that break its invariants
    pub fn apply(&self, base: RetryConfig) -> Result<RetryConfig> {
        let config = RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_backoff: self
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(base.initial_backoff),
            max_backoff: self
                .max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(base.max_backoff),
            ..base
        };
        config.validate().context("Invalid retry settings in config")?;
        Ok(config)
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mohua").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path; missing or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective region (CLI > config); provider resolution fills the rest
    pub fn effective_region(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.region.clone())
    }

    /// Get effective profile (CLI > config)
    pub fn effective_profile(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.profile.clone())
    }

    /// Retry policy: the shared default unless the config overrides it
    pub fn retry_config(&self) -> Result<Option<RetryConfig>> {
        if self.retry.is_empty() {
            return Ok(None);
        }
        self.retry.apply(RetryConfig::default()).map(Some)
    }

    /// Set region and save
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        self.region = Some(region.to_string());
        self.save()
    }

    /// Set profile and save
    pub fn set_profile(&mut self, profile: &str) -> Result<()> {
        self.profile = Some(profile.to_string());
        self.save()
    }
}
