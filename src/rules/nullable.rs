//! Inner rule sequence for a value that may itself be `None`.

use crate::core::context::ExecutionContext;
use crate::core::error::EngineResult;
use crate::core::tree::ErrorNode;
use crate::rules::Delegate;
use crate::scope::Scope;
use std::fmt;

/// Unwraps an `Option<U>` value and runs an inner sequence over `U`.
///
/// `None` (at either level) skips the inner sequence; under force the inner
/// sequence is forced regardless.
pub struct NullableRule<M, V> {
    inner: Box<dyn Delegate<M, V>>,
}

impl<M: 'static, U: 'static> NullableRule<M, Option<U>> {
    /// Wrap the sequence of `scope` for `Option<U>` values.
    ///
    /// Only the scope's rules and summary error apply; absence never emits Required.
    pub fn new(scope: Scope<M, U>) -> Self {
        Self {
            inner: Box::new(Unwrapped { scope }),
        }
    }
}

impl<M, V> NullableRule<M, V> {
    pub(crate) fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        self.inner.evaluate(model, value, ctx)
    }
}

impl<M, V> fmt::Debug for NullableRule<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullableRule")
            .field("inner", &self.inner.describe())
            .finish()
    }
}

struct Unwrapped<M, U> {
    scope: Scope<M, U>,
}

impl<M: 'static, U: 'static> Delegate<M, Option<U>> for Unwrapped<M, U> {
    fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&Option<U>>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        let inner = if ctx.is_force() {
            None
        } else {
            match value.and_then(Option::as_ref) {
                Some(inner) => Some(inner),
                None => return Ok(ErrorNode::new()),
            }
        };
        self.scope.evaluate_present(model, inner, ctx)
    }

    fn describe(&self) -> String {
        format!("{} rule(s)", self.scope.len())
    }
}
