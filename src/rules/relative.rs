//! Cross-field predicate over the containing model.

use crate::core::context::ExecutionContext;
use crate::core::error::ValidationError;
use crate::rules::{resolve_error, Predicate};
use std::fmt;
use std::sync::Arc;

/// Checks the containing model, but only when the member itself is present.
///
/// Expresses "if this field is set, something must hold for its siblings".
pub struct RelativeRule<M> {
    predicate: Predicate<M>,
    error: Option<Arc<ValidationError>>,
    override_error: Option<Arc<ValidationError>>,
}

impl<M> RelativeRule<M> {
    /// Create a rule from a predicate over the whole model.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
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
        model: Option<&M>,
        value_present: bool,
        ctx: &ExecutionContext<'_>,
    ) -> Option<Arc<ValidationError>> {
        if ctx.is_force() {
            return Some(resolve_error(&self.error, &self.override_error, ctx));
        }
        if !value_present {
            return None;
        }
        let model = model?;
        if (self.predicate)(model) {
            None
        } else {
            Some(resolve_error(&self.error, &self.override_error, ctx))
        }
    }
}

impl<M> fmt::Debug for RelativeRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelativeRule")
            .field("predicate", &"<closure>")
            .field("error", &self.error)
            .field("override_error", &self.override_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Strategy;
    use crate::core::options::ValidationOptions;
    use crate::execution::repository::Repository;

    struct Range {
        min: i32,
        max: i32,
    }

    fn ordered() -> RelativeRule<Range> {
        RelativeRule::new(|r: &Range| r.min <= r.max).message("Max must not be below min")
    }

    #[test]
    fn test_checks_siblings_when_present() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);

        let bad = Range { min: 5, max: 1 };
        let good = Range { min: 1, max: 5 };
        assert!(ordered().evaluate(Some(&bad), true, &ctx).is_some());
        assert!(ordered().evaluate(Some(&good), true, &ctx).is_none());
    }

    #[test]
    fn test_gated_on_member_presence() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);

        let bad = Range { min: 5, max: 1 };
        assert!(ordered().evaluate(Some(&bad), false, &ctx).is_none());
    }

    #[test]
    fn test_force_emits_without_model() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Force, &options, &repository);

        let error = ordered().evaluate(None, false, &ctx).unwrap();
        assert_eq!(error.template(), "Max must not be below min");
    }
}
