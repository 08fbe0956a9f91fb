//! Rule variants.
//!
//! Every rule evaluates one value `V` found inside a containing model `M` and
//! produces an [`ErrorNode`] fragment that the owning scope merges at its own level.
//! All variants follow the same strategy contract:
//! - Exhaustive / short-circuit: an absent value skips the rule.
//! - Force: no predicate runs and the rule reports as if it had failed.

pub mod collection;
pub mod model;
pub mod nullable;
pub mod relative;
pub mod value;

pub use collection::CollectionRule;
pub use model::{ModelRule, ScopeProducer};
pub use nullable::NullableRule;
pub use relative::RelativeRule;
pub use value::ValueRule;

use crate::core::context::ExecutionContext;
use crate::core::error::{EngineResult, ValidationError};
use crate::core::tree::ErrorNode;
use std::fmt;
use std::sync::Arc;

/// Shared predicate. Returns `true` when the value is valid.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A single rule of a scope's sequence.
pub enum Rule<M, V> {
    /// Predicate over the value itself.
    Value(ValueRule<V>),
    /// Predicate over the containing model, gated on the value being present.
    Relative(RelativeRule<M>),
    /// Inner sequence applied to the unwrapped value of an `Option`.
    Nullable(NullableRule<M, V>),
    /// Recursive validation of a nested model.
    Model(ModelRule<V>),
    /// Per-element validation of a collection.
    Collection(CollectionRule<M, V>),
}

impl<M: 'static, V: 'static> Rule<M, V> {
    /// Evaluate this rule against `value`.
    ///
    /// `model` is the containing model, absent only under the force strategy.
    pub fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        match self {
            Rule::Value(rule) => Ok(leaf(rule.evaluate(value, ctx))),
            Rule::Relative(rule) => Ok(leaf(rule.evaluate(model, value.is_some(), ctx))),
            Rule::Nullable(rule) => rule.evaluate(model, value, ctx),
            Rule::Model(rule) => rule.evaluate(value, ctx),
            Rule::Collection(rule) => rule.evaluate(model, value, ctx),
        }
    }
}

impl<M, V> Rule<M, V> {
    /// Short name of the variant, for logs and debugging.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Value(_) => "value",
            Rule::Relative(_) => "relative",
            Rule::Nullable(_) => "nullable",
            Rule::Model(_) => "model",
            Rule::Collection(_) => "collection",
        }
    }
}

impl<M, V> fmt::Debug for Rule<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Value(rule) => f.debug_tuple("Value").field(rule).finish(),
            Rule::Relative(rule) => f.debug_tuple("Relative").field(rule).finish(),
            Rule::Nullable(rule) => f.debug_tuple("Nullable").field(rule).finish(),
            Rule::Model(rule) => f.debug_tuple("Model").field(rule).finish(),
            Rule::Collection(rule) => f.debug_tuple("Collection").field(rule).finish(),
        }
    }
}

impl<M, V> From<ValueRule<V>> for Rule<M, V> {
    fn from(rule: ValueRule<V>) -> Self {
        Rule::Value(rule)
    }
}

impl<M, V> From<RelativeRule<M>> for Rule<M, V> {
    fn from(rule: RelativeRule<M>) -> Self {
        Rule::Relative(rule)
    }
}

impl<M, V> From<NullableRule<M, V>> for Rule<M, V> {
    fn from(rule: NullableRule<M, V>) -> Self {
        Rule::Nullable(rule)
    }
}

impl<M, V> From<ModelRule<V>> for Rule<M, V> {
    fn from(rule: ModelRule<V>) -> Self {
        Rule::Model(rule)
    }
}

impl<M, V> From<CollectionRule<M, V>> for Rule<M, V> {
    fn from(rule: CollectionRule<M, V>) -> Self {
        Rule::Collection(rule)
    }
}

/// Evaluation that reaches a different value type through `V`.
///
/// Lets nullable and collection rules hide their inner element type.
pub(crate) trait Delegate<M, V>: Send + Sync {
    fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode>;

    fn describe(&self) -> String;
}

/// Error of a leaf rule: the override, then the fixed error, then the context default.
pub(crate) fn resolve_error(
    fixed: &Option<Arc<ValidationError>>,
    override_error: &Option<Arc<ValidationError>>,
    ctx: &ExecutionContext<'_>,
) -> Arc<ValidationError> {
    override_error
        .as_ref()
        .or(fixed.as_ref())
        .unwrap_or_else(|| ctx.default_error())
        .clone()
}

fn leaf(error: Option<Arc<ValidationError>>) -> ErrorNode {
    let mut node = ErrorNode::new();
    if let Some(error) = error {
        node.add_error(error);
    }
    node
}
