//! Query configuration
//!
//! # Example
//!
//! ```yaml
//! var_prefix: V
//! libraries:
//!   - lists
//!   - between
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PlError, PlResult};
use crate::query::DEFAULT_VAR_PREFIX;

/// Settings shared by the query pipeline and engine backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrologConfig {
    /// Prefix for variables named after their argument position
    pub var_prefix: String,

    /// Library modules loaded before user programs, e.g. `lists`
    pub libraries: Vec<String>,
}

impl Default for PrologConfig {
    fn default() -> Self {
        Self {
            var_prefix: DEFAULT_VAR_PREFIX.to_string(),
            libraries: Vec::new(),
        }
    }
}

impl PrologConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> PlResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> PlResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries = libraries.into_iter().map(Into::into).collect();
        self
    }

    /// Check that generated variable names and library names are readable
    /// by the engine
    pub fn validate(&self) -> PlResult<()> {
        let mut chars = self.var_prefix.chars();
        let starts_ok = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_uppercase());
        if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PlError::InvalidConfig(format!(
                "var_prefix '{}' is not a variable name",
                self.var_prefix
            )));
        }

        for library in &self.libraries {
            let mut chars = library.chars();
            let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(PlError::InvalidConfig(format!(
                    "library '{}' is not a module name",
                    library
                )));
            }
        }
        Ok(())
    }
}
