//! Error types for Ambit.
//!
//! Two categories live here and never mix:
//! - [`ValidationError`]: an expected validation outcome. It is plain data carried
//!   by the error tree and is never returned through `Err`.
//! - [`EngineError`]: misuse of the engine or a broken schema. Always fatal, it
//!   aborts the whole validation call.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Modifier names reported by [`EngineError::DuplicateModifier`].
pub mod modifier {
    /// Scope key override.
    pub const NAME: &str = "name";
    /// Custom Required error.
    pub const REQUIRED_ERROR: &str = "required_error";
    /// Summary error collapsing a scope's own errors.
    pub const SUMMARY_ERROR: &str = "summary_error";
    /// Optional flag.
    pub const OPTIONAL: &str = "optional";
}

/// Fatal engine or configuration fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A set-once scope modifier was set twice.
    #[error("Modifier '{modifier}' was set more than once on the same scope")]
    DuplicateModifier {
        /// Name of the modifier, see [`modifier`].
        modifier: &'static str,
    },

    /// A nested descent went past the configured maximum depth.
    #[error("Maximum recursion depth {max_depth} exceeded (reached depth {depth})")]
    MaxDepthExceeded {
        /// Depth the descent would have reached.
        depth: usize,
        /// Configured maximum.
        max_depth: usize,
    },

    /// No scope is cached or registered for a repository key.
    #[error("No specification registered for '{key}'")]
    MissingSpecification {
        /// The repository key.
        key: String,
    },

    /// A repository entry holds a scope of another model type.
    #[error("Specification '{key}' does not describe type {expected}")]
    SpecificationTypeMismatch {
        /// The repository key.
        key: String,
        /// Requested model type.
        expected: &'static str,
    },

    /// Options failed validation.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// An options document could not be parsed.
    #[error("Failed to parse options: {0}")]
    Config(String),
}

impl EngineError {
    /// Check if this fault was caused by runaway recursion.
    pub fn is_depth_fault(&self) -> bool {
        matches!(self, EngineError::MaxDepthExceeded { .. })
    }

    /// Check if this fault points at a malformed schema rather than bad options.
    pub fn is_schema_fault(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicateModifier { .. }
                | EngineError::MissingSpecification { .. }
                | EngineError::SpecificationTypeMismatch { .. }
        )
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(error: toml::de::Error) -> Self {
        EngineError::Config(error.to_string())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Validation Errors
// ============================================================================

/// A named argument of a [`ValidationError`] template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    /// Placeholder name, referenced as `{name}` in the template.
    pub name: String,
    /// Argument value.
    pub value: serde_json::Value,
    /// Optional format hint for the renderer (e.g. `.2` for two decimals).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Argument {
    /// Render the value the way it appears inside a message.
    pub fn display(&self) -> String {
        if let (serde_json::Value::Number(number), Some(format)) = (&self.value, &self.format) {
            let precision = format.strip_prefix('.').and_then(|p| p.parse::<usize>().ok());
            if let (Some(precision), Some(number)) = (precision, number.as_f64()) {
                return format!("{:.*}", precision, number);
            }
        }
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// An immutable message template plus its named arguments.
///
/// The engine only decides where a template belongs in the error tree; turning it
/// into a final string is left to the report renderer. Errors are shared as
/// `Arc<ValidationError>` so that defaults (like the Required error) can be
/// recognized by identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    template: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    arguments: Vec<Argument>,
}

impl ValidationError {
    /// Create an error with no arguments.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            arguments: Vec::new(),
        }
    }

    /// Create a shared error with no arguments.
    pub fn shared(template: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(template))
    }

    /// Add a named argument.
    pub fn with_argument(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value: value.into(),
            format: None,
        });
        self
    }

    /// Add a named argument with a format hint.
    pub fn with_formatted_argument(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
        format: impl Into<String>,
    ) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value: value.into(),
            format: Some(format.into()),
        });
        self
    }

    /// Wrap into an `Arc` for attaching to rules and scopes.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The raw message template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Arguments in declaration order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Expand `{name}` placeholders from the arguments.
    ///
    /// Placeholders without a matching argument are kept verbatim.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let name = &after[..end];
            match self.argument(name) {
                Some(argument) => out.push_str(&argument.display()),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
