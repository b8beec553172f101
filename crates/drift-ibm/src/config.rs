//! Behavior module configuration.

use drift_core::ConfigError;
use indexmap::IndexMap;

/// Name and numeric parameters of the behavior module of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IbmConfig {
    /// Registry name of the module.
    pub name: String,
    /// Module parameters by name.
    pub params: IndexMap<String, f64>,
}

impl IbmConfig {
    /// Configuration for module `name` with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    /// Set parameter `key`.
    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// A required, finite parameter.
    pub fn require(&self, key: &str) -> Result<f64, ConfigError> {
        let value = *self
            .params
            .get(key)
            .ok_or_else(|| ConfigError::MissingParameter {
                name: self.qualified(key),
            })?;
        self.finite(key, value)
    }

    /// An optional finite parameter with a default.
    pub fn get_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.params.get(key) {
            Some(&value) => self.finite(key, value),
            None => Ok(default),
        }
    }

    /// A boolean flag; any non-zero value is `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|&v| v != 0.0)
    }

    pub(crate) fn invalid(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidParameter {
            name: self.qualified(key),
            reason: reason.into(),
        }
    }

    fn finite(&self, key: &str, value: f64) -> Result<f64, ConfigError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(key, format!("must be finite, got {value}")))
        }
    }

    fn qualified(&self, key: &str) -> String {
        format!("{}.{key}", self.name)
    }
}
