//! Predicate over a member's own value.

use crate::core::context::ExecutionContext;
use crate::core::error::ValidationError;
use crate::rules::{resolve_error, Predicate};
use std::fmt;
use std::sync::Arc;

/// Checks the value itself.
///
/// An absent value is skipped unless the strategy is force, in which case the
/// rule's error is emitted without calling the predicate.
pub struct ValueRule<V> {
    predicate: Predicate<V>,
    error: Option<Arc<ValidationError>>,
    override_error: Option<Arc<ValidationError>>,
}

impl<V> ValueRule<V> {
    /// Create a rule from a predicate returning `true` for valid values.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            error: None,
            override_error: None,
        }
    }

    /// Set the rule's own error.
    pub fn error(mut self, error: Arc<ValidationError>) -> Self {
        self.error = Some(error);
        self
    }

    /// Set the rule's own error from a plain message.
    pub fn message(self, template: impl Into<String>) -> Self {
        self.error(ValidationError::shared(template))
    }

    /// Replace the rule's error at the call site.
    pub fn with_override(mut self, error: Arc<ValidationError>) -> Self {
        self.override_error = Some(error);
        self
    }

    pub(crate) fn evaluate(
        &self,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> Option<Arc<ValidationError>> {
        if ctx.is_force() {
            return Some(resolve_error(&self.error, &self.override_error, ctx));
        }
        let value = value?;
        if (self.predicate)(value) {
            None
        } else {
            Some(resolve_error(&self.error, &self.override_error, ctx))
        }
    }
}

impl<V> fmt::Debug for ValueRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRule")
            .field("predicate", &"<closure>")
            .field("error", &self.error)
            .field("override_error", &self.override_error)
            .finish()
    }
}
