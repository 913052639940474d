//! Policy switches for the aggregator, loadable from the environment.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Switches consumed by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Run the annotation tier (default: `true`).
    pub annotation_enabled: bool,
    /// Run the custom-validator tier (default: `true`).
    pub custom_validator_enabled: bool,
    /// Report a failure when the instance itself is missing (default: `true`).
    pub failure_if_instance_is_null: bool,
    /// Report a failure when no tier applies to a type (default: `false`).
    pub failure_if_project_not_match: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            annotation_enabled: true,
            custom_validator_enabled: true,
            failure_if_instance_is_null: true,
            failure_if_project_not_match: false,
        }
    }
}

impl ValidationOptions {
    /// Load options from environment variables with defaults.
    ///
    /// | Env Var                              | Default |
    /// |--------------------------------------|---------|
    /// | `VOUCH_ANNOTATION_ENABLED`           | `true`  |
    /// | `VOUCH_CUSTOM_VALIDATOR_ENABLED`     | `true`  |
    /// | `VOUCH_FAILURE_IF_INSTANCE_IS_NULL`  | `true`  |
    /// | `VOUCH_FAILURE_IF_PROJECT_NOT_MATCH` | `false` |
    ///
    /// Accepted values are `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &'static str, default: bool| match lookup(key) {
            Some(raw) => parse_flag(key, &raw),
            None => Ok(default),
        };

        Ok(Self {
            annotation_enabled: flag("VOUCH_ANNOTATION_ENABLED", defaults.annotation_enabled)?,
            custom_validator_enabled: flag(
                "VOUCH_CUSTOM_VALIDATOR_ENABLED",
                defaults.custom_validator_enabled,
            )?,
            failure_if_instance_is_null: flag(
                "VOUCH_FAILURE_IF_INSTANCE_IS_NULL",
                defaults.failure_if_instance_is_null,
            )?,
            failure_if_project_not_match: flag(
                "VOUCH_FAILURE_IF_PROJECT_NOT_MATCH",
                defaults.failure_if_project_not_match,
            )?,
        })
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ValidationError::InvalidOption {
            key,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}
