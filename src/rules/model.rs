//! Recursive validation of a nested model.

use crate::core::context::ExecutionContext;
use crate::core::error::EngineResult;
use crate::core::tree::ErrorNode;
use crate::scope::ModelScope;
use std::fmt;
use std::sync::Arc;

/// Lazily produces the scope of a model type. Invoked at most once per repository key.
pub type ScopeProducer<T> = Arc<dyn Fn() -> EngineResult<ModelScope<T>> + Send + Sync>;

enum ModelSource<V> {
    Registered,
    Named(String),
    Produced(ScopeProducer<V>),
    Inline(Arc<ModelScope<V>>),
}

/// Validates a nested model with its own whole-model scope.
///
/// The scope is resolved at evaluation time, which lets mutually recursive
/// types refer to each other by type before either scope exists. Each
/// evaluation descends one level deeper in the execution context.
pub struct ModelRule<V> {
    source: ModelSource<V>,
}

impl<V: 'static> ModelRule<V> {
    /// Resolve the scope registered in the repository for `V`.
    pub fn by_type() -> Self {
        Self {
            source: ModelSource::Registered,
        }
    }

    /// Resolve the scope stored under an explicit repository key.
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            source: ModelSource::Named(key.into()),
        }
    }

    /// Resolve through the repository by type, preferring `producer` over a
    /// globally registered one when the type is not cached yet.
    pub fn produced_by<F>(producer: F) -> Self
    where
        F: Fn() -> EngineResult<ModelScope<V>> + Send + Sync + 'static,
    {
        Self {
            source: ModelSource::Produced(Arc::new(producer)),
        }
    }

    /// Use a scope supplied at the call site, bypassing the repository.
    pub fn inline(scope: ModelScope<V>) -> Self {
        Self::shared(Arc::new(scope))
    }

    /// Use an already shared scope, bypassing the repository.
    pub fn shared(scope: Arc<ModelScope<V>>) -> Self {
        Self {
            source: ModelSource::Inline(scope),
        }
    }

    fn resolve(&self, ctx: &ExecutionContext<'_>) -> EngineResult<Arc<ModelScope<V>>> {
        let repository = ctx.repository();
        match &self.source {
            ModelSource::Registered => repository.get::<V>(),
            ModelSource::Named(key) => repository.get_named::<V>(key),
            ModelSource::Produced(producer) => repository.get_or_init::<V>(Some(producer.clone())),
            ModelSource::Inline(scope) => Ok(scope.clone()),
        }
    }

    pub(crate) fn evaluate(
        &self,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        if !ctx.is_force() && value.is_none() {
            return Ok(ErrorNode::new());
        }

        let nested = ctx.descend()?;
        let scope = self.resolve(ctx)?;
        let model = if ctx.is_force() { None } else { value };
        scope.evaluate(model, &nested)
    }
}

impl<V: 'static> Default for ModelRule<V> {
    fn default() -> Self {
        Self::by_type()
    }
}

impl<V> fmt::Debug for ModelRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ModelSource::Registered => "registered".to_string(),
            ModelSource::Named(key) => format!("named '{}'", key),
            ModelSource::Produced(_) => "producer".to_string(),
            ModelSource::Inline(_) => "inline".to_string(),
        };
        f.debug_struct("ModelRule").field("source", &source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Strategy;
    use crate::core::error::EngineError;
    use crate::core::options::ValidationOptions;
    use crate::execution::repository::Repository;
    use crate::rules::ValueRule;
    use crate::scope::Scope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Address {
        city: Option<String>,
    }

    fn address_scope() -> ModelScope<Address> {
        ModelScope::builder()
            .member(
                "City",
                |a: &Address| a.city.as_ref(),
                Scope::builder()
                    .value(ValueRule::new(|c: &String| c.len() > 1).message("Too short"))
                    .build()
                    .unwrap(),
            )
            .build()
    }

    #[test]
    fn test_inline_scope_validates_nested_model() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);

        let address = Address {
            city: Some("X".to_string()),
        };
        let node = ModelRule::inline(address_scope())
            .evaluate(Some(&address), &ctx)
            .unwrap();
        assert_eq!(node.path(&["City"]).unwrap().errors()[0].template(), "Too short");
    }

    #[test]
    fn test_absent_model_is_skipped_without_descent() {
        let options = ValidationOptions::default().with_max_depth(0);
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);

        let node = ModelRule::<Address>::by_type().evaluate(None, &ctx).unwrap();
        assert!(node.is_empty());
    }

    #[test]
    fn test_force_recurses_without_model() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Force, &options, &repository);

        let node = ModelRule::inline(address_scope()).evaluate(None, &ctx).unwrap();
        let city: Vec<_> = node
            .child("City")
            .unwrap()
            .errors()
            .iter()
            .map(|e| e.template())
            .collect();
        assert_eq!(city, vec!["Required", "Too short"]);
    }

    #[test]
    fn test_unregistered_type_is_a_fault() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);

        let address = Address { city: None };
        let err = ModelRule::<Address>::by_type()
            .evaluate(Some(&address), &ctx)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingSpecification { .. }));
    }

    #[test]
    fn test_producer_is_memoized_in_repository() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let rule = ModelRule::produced_by(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(address_scope())
        });

        let address = Address {
            city: Some("Oslo".to_string()),
        };
        for _ in 0..3 {
            assert!(rule.evaluate(Some(&address), &ctx).unwrap().is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
