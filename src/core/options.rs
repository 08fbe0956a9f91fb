//! Global validation options.

use crate::core::error::{EngineError, EngineResult, ValidationError};
use serde::Deserialize;
use std::sync::Arc;

/// Default message of the shared Required error.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "Required";

/// Default message used by rules that carry no error of their own.
pub const DEFAULT_INVALID_MESSAGE: &str = "Invalid";

/// Default key for forced collection results.
pub const DEFAULT_FORCE_KEY: &str = "*";

/// Default ceiling on recursive descents.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Options shared by every scope and rule of a validation call.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Error attached when a required value is absent.
    pub required_error: Arc<ValidationError>,
    /// Error emitted by rules that have no configured error.
    pub default_error: Arc<ValidationError>,
    /// Key under which a forced collection result is attached.
    pub force_key: String,
    /// Maximum number of nested model/collection descents.
    pub max_depth: usize,
    /// Dry-run every root scope under force before its first validation, so a
    /// scope deeper than `max_depth` faults regardless of the data.
    pub schema_check: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            required_error: ValidationError::shared(DEFAULT_REQUIRED_MESSAGE),
            default_error: ValidationError::shared(DEFAULT_INVALID_MESSAGE),
            force_key: DEFAULT_FORCE_KEY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            schema_check: true,
        }
    }
}

impl ValidationOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared Required error.
    pub fn with_required_error(mut self, error: Arc<ValidationError>) -> Self {
        self.required_error = error;
        self
    }

    /// Set the Required error from a plain message.
    pub fn with_required_message(self, message: impl Into<String>) -> Self {
        self.with_required_error(ValidationError::shared(message))
    }

    /// Set the error used by rules without a configured error.
    pub fn with_default_error(mut self, error: Arc<ValidationError>) -> Self {
        self.default_error = error;
        self
    }

    /// Set the force key.
    pub fn with_force_key(mut self, key: impl Into<String>) -> Self {
        self.force_key = key.into();
        self
    }

    /// Set the maximum recursion depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable the schema depth check.
    pub fn with_schema_check(mut self, enabled: bool) -> Self {
        self.schema_check = enabled;
        self
    }

    /// Check that the options can be used by the engine.
    pub fn validate(&self) -> EngineResult<()> {
        if self.force_key.is_empty() {
            return Err(EngineError::InvalidOptions(
                "force key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load options from a TOML document.
    ///
    /// Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let file: OptionsFile = toml::from_str(source)?;
        let options = file.into_options();
        options.validate()?;
        Ok(options)
    }
}

/// On-disk shape of [`ValidationOptions`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsFile {
    /// Message of the Required error.
    pub required_message: Option<String>,
    /// Message of the default rule error.
    pub invalid_message: Option<String>,
    /// Force key.
    pub force_key: Option<String>,
    /// Maximum recursion depth.
    pub max_depth: Option<usize>,
    /// Schema depth check.
    pub schema_check: Option<bool>,
}

impl OptionsFile {
    /// Overlay the file onto the defaults.
    pub fn into_options(self) -> ValidationOptions {
        let mut options = ValidationOptions::default();
        if let Some(message) = self.required_message {
            options = options.with_required_message(message);
        }
        if let Some(message) = self.invalid_message {
            options = options.with_default_error(ValidationError::shared(message));
        }
        if let Some(key) = self.force_key {
            options = options.with_force_key(key);
        }
        if let Some(depth) = self.max_depth {
            options = options.with_max_depth(depth);
        }
        if let Some(enabled) = self.schema_check {
            options = options.with_schema_check(enabled);
        }
        options
    }
}
