//! Per-element validation of a sequence member.

use crate::core::context::ExecutionContext;
use crate::core::error::EngineResult;
use crate::core::tree::ErrorNode;
use crate::rules::Delegate;
use crate::scope::Scope;
use std::fmt;

/// Element accessor for a collection of `E` stored in `V`.
///
/// `None` marks an absent element.
pub type Elements<V, E> = Box<dyn for<'a> Fn(&'a V) -> Vec<Option<&'a E>> + Send + Sync>;

/// Applies an element scope to every item of a collection.
///
/// Results are attached under the stringified zero-based index. Under force the
/// collection is not iterated: the element scope is forced once and attached
/// under the force key.
pub struct CollectionRule<M, V> {
    inner: Box<dyn Delegate<M, V>>,
}

impl<M: 'static, V: 'static> CollectionRule<M, V> {
    /// Iterate elements of the declared type `E` through an explicit accessor.
    pub fn new<E, F>(elements: F, scope: Scope<M, E>) -> Self
    where
        E: 'static,
        F: for<'a> Fn(&'a V) -> Vec<Option<&'a E>> + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(Each {
                elements: Box::new(elements),
                scope,
            }),
        }
    }

    /// Iterate a slice-like collection whose items are always present.
    pub fn items<E: 'static>(scope: Scope<M, E>) -> Self
    where
        V: AsRef<[E]>,
    {
        Self::new(|collection: &V| collection.as_ref().iter().map(Some).collect(), scope)
    }

    /// Iterate a slice-like collection of optional items.
    pub fn nullable_items<E: 'static>(scope: Scope<M, E>) -> Self
    where
        V: AsRef<[Option<E>]>,
    {
        Self::new(
            |collection: &V| collection.as_ref().iter().map(Option::as_ref).collect(),
            scope,
        )
    }
}

impl<M, V> CollectionRule<M, V> {
    pub(crate) fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        self.inner.evaluate(model, value, ctx)
    }
}

impl<M, V> fmt::Debug for CollectionRule<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRule")
            .field("inner", &self.inner.describe())
            .finish()
    }
}

struct Each<M, V, E> {
    elements: Elements<V, E>,
    scope: Scope<M, E>,
}

impl<M: 'static, V: 'static, E: 'static> Delegate<M, V> for Each<M, V, E> {
    fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        let mut node = ErrorNode::new();

        if ctx.is_force() {
            let nested = ctx.descend()?;
            let forced = self.scope.evaluate(model, None, &nested)?;
            node.attach(ctx.force_key(), forced);
            return Ok(node);
        }

        let Some(collection) = value else {
            return Ok(node);
        };
        let elements = (self.elements)(collection);
        if elements.is_empty() {
            return Ok(node);
        }

        let nested = ctx.descend()?;
        for (index, element) in elements.into_iter().enumerate() {
            let result = self.scope.evaluate(model, element, &nested)?;
            let failed = !result.is_empty();
            node.attach(index.to_string(), result);
            if failed && ctx.strategy().stops_on_first_error() {
                log::trace!("short-circuit: stopping collection at element {}", index);
                break;
            }
        }

        Ok(node)
    }

    fn describe(&self) -> String {
        format!("each element: {} rule(s)", self.scope.len())
    }
}
