//! Ordered rule sequence for one location of the model graph.

use crate::core::context::ExecutionContext;
use crate::core::error::{modifier, EngineError, EngineResult, ValidationError};
use crate::core::tree::ErrorNode;
use crate::rules::{CollectionRule, ModelRule, NullableRule, RelativeRule, Rule, ValueRule};
use std::fmt;
use std::sync::Arc;

/// Rules for a value `V` inside a containing model `M`, plus absence and
/// override modifiers.
///
/// Rules are evaluated strictly in declaration order. Scopes are immutable once
/// built; use [`ScopeBuilder`] to create them.
pub struct Scope<M, V> {
    rules: Vec<Rule<M, V>>,
    name: Option<String>,
    required_error: Option<Arc<ValidationError>>,
    summary_error: Option<Arc<ValidationError>>,
    optional: bool,
}

impl<M, V> Scope<M, V> {
    /// Start building a scope.
    pub fn builder() -> ScopeBuilder<M, V> {
        ScopeBuilder::new()
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule<M, V>] {
        &self.rules
    }

    /// Key override for the error tree.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Custom Required error, if set.
    pub fn required_error(&self) -> Option<&Arc<ValidationError>> {
        self.required_error.as_ref()
    }

    /// Summary error, if set.
    pub fn summary_error(&self) -> Option<&Arc<ValidationError>> {
        self.summary_error.as_ref()
    }

    /// Whether an absent value is accepted.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the scope has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<M: 'static, V: 'static> Scope<M, V> {
    /// Evaluate the scope for a possibly absent value.
    ///
    /// An absent value attaches the Required error instead of running rules,
    /// unless the scope is optional. Under force the Required error is attached
    /// (unless optional) and every rule is forced as well.
    pub fn evaluate(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        let mut node = ErrorNode::new();

        if ctx.is_force() {
            if !self.optional {
                node.add_error(self.resolve_required(ctx));
            }
            node.merge(self.evaluate_rules(model, None, ctx)?);
        } else {
            match value {
                Some(value) => node.merge(self.evaluate_rules(model, Some(value), ctx)?),
                None if !self.optional => node.add_error(self.resolve_required(ctx)),
                None => {}
            }
        }

        Ok(self.summarize(node))
    }

    /// Evaluate the rules of a scope whose value needs no absence check.
    ///
    /// Used for self scopes and unwrapped nullable values.
    pub fn evaluate_present(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        let node = self.evaluate_rules(model, value, ctx)?;
        Ok(self.summarize(node))
    }

    fn evaluate_rules(
        &self,
        model: Option<&M>,
        value: Option<&V>,
        ctx: &ExecutionContext<'_>,
    ) -> EngineResult<ErrorNode> {
        let mut node = ErrorNode::new();

        for (index, rule) in self.rules.iter().enumerate() {
            let fragment = rule.evaluate(model, value, ctx)?;
            let failed = !fragment.is_empty();
            node.merge(fragment);

            if failed && ctx.strategy().stops_on_first_error() {
                log::trace!(
                    "short-circuit: {} rule at index {} failed, skipping {} rule(s)",
                    rule.kind(),
                    index,
                    self.rules.len() - index - 1
                );
                break;
            }
        }

        Ok(node)
    }

    fn resolve_required(&self, ctx: &ExecutionContext<'_>) -> Arc<ValidationError> {
        self.required_error
            .as_ref()
            .unwrap_or_else(|| ctx.required_error())
            .clone()
    }

    fn summarize(&self, mut node: ErrorNode) -> ErrorNode {
        if let Some(summary) = &self.summary_error {
            if !node.errors().is_empty() {
                node.collapse_errors(summary.clone());
            }
        }
        node
    }
}

impl<M, V> fmt::Debug for Scope<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("rules", &self.rules)
            .field("name", &self.name)
            .field("required_error", &self.required_error)
            .field("summary_error", &self.summary_error)
            .field("optional", &self.optional)
            .finish()
    }
}

// ============================================================================
// Scope Builder
// ============================================================================

/// Builder for [`Scope`].
///
/// Rules keep their declaration order; modifiers may be set in any order but
/// each at most once. Setting a modifier twice is reported by [`build`](Self::build).
pub struct ScopeBuilder<M, V> {
    rules: Vec<Rule<M, V>>,
    name: Option<String>,
    required_error: Option<Arc<ValidationError>>,
    summary_error: Option<Arc<ValidationError>>,
    optional: bool,
    name_set: bool,
    required_error_set: bool,
    summary_error_set: bool,
    optional_set: bool,
    fault: Option<EngineError>,
}

impl<M, V> Default for ScopeBuilder<M, V> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            name: None,
            required_error: None,
            summary_error: None,
            optional: false,
            name_set: false,
            required_error_set: false,
            summary_error_set: false,
            optional_set: false,
            fault: None,
        }
    }
}

impl<M, V> ScopeBuilder<M, V> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append any rule.
    pub fn rule(mut self, rule: Rule<M, V>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a value rule.
    pub fn value(self, rule: ValueRule<V>) -> Self {
        self.rule(Rule::Value(rule))
    }

    /// Append a value rule from a predicate and message.
    pub fn must<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.value(ValueRule::new(predicate).message(message))
    }

    /// Append a relative rule.
    pub fn relative(self, rule: RelativeRule<M>) -> Self {
        self.rule(Rule::Relative(rule))
    }

    /// Append a nullable rule.
    pub fn nullable(self, rule: NullableRule<M, V>) -> Self {
        self.rule(Rule::Nullable(rule))
    }

    /// Append a nested model rule.
    pub fn model(self, rule: ModelRule<V>) -> Self {
        self.rule(Rule::Model(rule))
    }

    /// Append a collection rule.
    pub fn collection(self, rule: CollectionRule<M, V>) -> Self {
        self.rule(Rule::Collection(rule))
    }

    /// Override the key this scope is attached under.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if claim(&mut self.name_set, modifier::NAME, &mut self.fault) {
            self.name = Some(name.into());
        }
        self
    }

    /// Use a custom Required error.
    pub fn required_error(mut self, error: Arc<ValidationError>) -> Self {
        if claim(
            &mut self.required_error_set,
            modifier::REQUIRED_ERROR,
            &mut self.fault,
        ) {
            self.required_error = Some(error);
        }
        self
    }

    /// Use a custom Required message.
    pub fn required_message(self, template: impl Into<String>) -> Self {
        self.required_error(ValidationError::shared(template))
    }

    /// Collapse this scope's own errors into `error`.
    pub fn summary_error(mut self, error: Arc<ValidationError>) -> Self {
        if claim(
            &mut self.summary_error_set,
            modifier::SUMMARY_ERROR,
            &mut self.fault,
        ) {
            self.summary_error = Some(error);
        }
        self
    }

    /// Collapse this scope's own errors into a single message.
    pub fn summary_message(self, template: impl Into<String>) -> Self {
        self.summary_error(ValidationError::shared(template))
    }

    /// Accept an absent value without a Required error.
    pub fn optional(mut self) -> Self {
        if claim(&mut self.optional_set, modifier::OPTIONAL, &mut self.fault) {
            self.optional = true;
        }
        self
    }

    /// Finish the scope, failing on the first duplicated modifier.
    pub fn build(self) -> EngineResult<Scope<M, V>> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        Ok(Scope {
            rules: self.rules,
            name: self.name,
            required_error: self.required_error,
            summary_error: self.summary_error,
            optional: self.optional,
        })
    }
}

/// Mark a modifier as set, recording a fault if it already was.
fn claim(flag: &mut bool, modifier: &'static str, fault: &mut Option<EngineError>) -> bool {
    if *flag {
        fault.get_or_insert(EngineError::DuplicateModifier { modifier });
        return false;
    }
    *flag = true;
    true
}
