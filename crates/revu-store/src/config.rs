//! `config.toml` in the data directory.
//!
//! Every field has a default, so a missing file or a partial file both load.

use std::fs;
use std::path::Path;

use revu_core::{AllocationOptions, FeedbackPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

pub const CONFIG_FILE: &str = "config.toml";

fn default_user() -> String {
    "default".to_string()
}

fn default_max_questions() -> usize {
    20
}

fn default_target_duration_minutes() -> f64 {
    15.0
}

fn default_true() -> bool {
    true
}

/// Session defaults, overridable per `plan` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    #[serde(default = "default_target_duration_minutes")]
    pub target_duration_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_preference: Option<u8>,
    #[serde(default = "default_true")]
    pub balance_by_difficulty: bool,
    #[serde(default = "default_true")]
    pub prevent_clustering: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            target_duration_minutes: default_target_duration_minutes(),
            difficulty_preference: None,
            balance_by_difficulty: true,
            prevent_clustering: true,
        }
    }
}

impl AllocationConfig {
    pub fn to_options(&self) -> AllocationOptions {
        AllocationOptions {
            max_questions: self.max_questions,
            target_duration_minutes: self.target_duration_minutes,
            difficulty_preference: self.difficulty_preference,
            balance_by_difficulty: self.balance_by_difficulty,
            prevent_clustering: self.prevent_clustering,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub feedback: FeedbackPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: default_user(),
            allocation: AllocationConfig::default(),
            feedback: FeedbackPolicy::default(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.user.trim().is_empty() {
            return Err(StoreError::Config("user must not be empty".into()));
        }
        self.allocation.to_options().validate()?;
        self.feedback.validate()?;
        Ok(())
    }
}
