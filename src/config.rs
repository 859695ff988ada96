//! Runtime settings loaded from an optional YAML file.
//!
//! ```yaml
//! tenant_id: abcdefghijklmnopqrstuvwxyz123456
//! retry: until_stable   # or "single"
//! max_passes: 8
//! log_level: debug
//! ```

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::resources::DEFAULT_TENANT_ID;
use crate::template::resolver::{RetryPolicy, DEFAULT_MAX_PASSES};

/// Retry strategy for deferred declarations
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// One retry pass
    Single,
    /// Retry while passes make progress
    #[default]
    UntilStable,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,
    #[serde(default)]
    pub retry: RetryMode,
    /// Pass limit for `until_stable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_passes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tenant_id: default_tenant_id(),
            retry: RetryMode::default(),
            max_passes: None,
            log_level: None,
        }
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid tenant id: {0}")]
    InvalidTenant(String),
    #[error("Invalid retry settings: {0}")]
    InvalidRetry(String),
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tenant_id.trim().is_empty() {
            return Err(SettingsError::InvalidTenant("tenant_id must not be empty".to_string()));
        }

        if let Some(max_passes) = self.max_passes {
            if max_passes < 2 {
                return Err(SettingsError::InvalidRetry(format!(
                    "max_passes must be at least 2, got {}",
                    max_passes
                )));
            }
            if self.retry == RetryMode::Single {
                log::warn!("max_passes is ignored with retry: single");
            }
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self.retry {
            RetryMode::Single => RetryPolicy::SingleRetry,
            RetryMode::UntilStable => RetryPolicy::UntilStable {
                max_passes: self.max_passes.unwrap_or(DEFAULT_MAX_PASSES),
            },
        }
    }
}

/// Load and validate settings from a YAML file
pub fn load_settings(settings_path: &Path) -> Result<Settings> {
    info!("Loading settings from: {:?}", settings_path);

    let file = File::open(settings_path)
        .wrap_err_with(|| format!("Failed to open settings '{}'", settings_path.display()))?;
    let settings: Settings = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse settings '{}'", settings_path.display()))?;

    settings.validate()?;
    Ok(settings)
}
