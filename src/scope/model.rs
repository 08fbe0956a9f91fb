//! Whole-model scope: self scopes and member scopes in declaration order.

use crate::core::context::ExecutionContext;
use crate::core::error::EngineResult;
use crate::core::tree::ErrorNode;
use crate::scope::Scope;
use std::fmt;

/// Member accessor. `None` means the member is absent.
pub type Getter<M, V> = Box<dyn for<'a> Fn(&'a M) -> Option<&'a V> + Send + Sync>;

/// The complete rule tree of a model type.
///
/// Slots are evaluated in declaration order. Each slot is its own rule
/// sequence, so short-circuiting in one slot never prevents the next slot
/// from running.
pub struct ModelScope<M> {
    slots: Vec<Slot<M>>,
}

enum Slot<M> {
    /// Rules over the model itself, reported at the model's own level.
    Own(Scope<M, M>),
    /// Rules over one member, reported under the member key.
    Member(Box<dyn MemberSlot<M>>),
}

trait MemberSlot<M>: Send + Sync {
    fn key(&self) -> &str;

    fn evaluate(&self, model: Option<&M>, ctx: &ExecutionContext<'_>) -> EngineResult<ErrorNode>;
}

struct Member<M, V> {
    key: String,
    getter: Getter<M, V>,
    scope: Scope<M, V>,
}

impl<M: 'static, V: 'static> MemberSlot<M> for Member<M, V> {
    fn key(&self) -> &str {
        self.scope.name().unwrap_or(&self.key)
    }

    fn evaluate(&self, model: Option<&M>, ctx: &ExecutionContext<'_>) -> EngineResult<ErrorNode> {
        let value = if ctx.is_force() {
            None
        } else {
            model.and_then(|m| (self.getter)(m))
        };
        self.scope.evaluate(model, value, ctx)
    }
}

impl<M> ModelScope<M> {
    /// Start building a model scope.
    pub fn builder() -> ModelScopeBuilder<M> {
        ModelScopeBuilder::new()
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the scope declares nothing.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Member keys in declaration order, after name overrides.
    pub fn member_keys(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Member(member) => Some(member.key()),
                Slot::Own(_) => None,
            })
            .collect()
    }
}

impl<M: 'static> ModelScope<M> {
    /// Evaluate every slot against `model`.
    ///
    /// `model` is `None` only under the force strategy.
    pub fn evaluate(&self, model: Option<&M>, ctx: &ExecutionContext<'_>) -> EngineResult<ErrorNode> {
        let mut node = ErrorNode::new();

        for slot in &self.slots {
            match slot {
                Slot::Own(scope) => {
                    let own = scope.evaluate_present(model, model, ctx)?;
                    match scope.name() {
                        Some(name) => node.attach(name, own),
                        None => node.merge(own),
                    }
                }
                Slot::Member(member) => {
                    let result = member.evaluate(model, ctx)?;
                    node.attach(member.key(), result);
                }
            }
        }

        Ok(node)
    }
}

impl<M> fmt::Debug for ModelScope<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<String> = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Own(scope) => format!("self ({} rule(s))", scope.len()),
                Slot::Member(member) => format!("member '{}'", member.key()),
            })
            .collect();
        f.debug_struct("ModelScope").field("slots", &slots).finish()
    }
}

/// Builder for [`ModelScope`].
pub struct ModelScopeBuilder<M> {
    slots: Vec<Slot<M>>,
}

impl<M> Default for ModelScopeBuilder<M> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<M> ModelScopeBuilder<M> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a self scope: rules over the whole model.
    pub fn rules(mut self, scope: Scope<M, M>) -> Self {
        self.slots.push(Slot::Own(scope));
        self
    }

    /// Finish the model scope.
    pub fn build(self) -> ModelScope<M> {
        ModelScope { slots: self.slots }
    }
}

impl<M: 'static> ModelScopeBuilder<M> {
    /// Add a member scope reached through `getter`.
    ///
    /// Two member scopes with the same key merge their results in the tree.
    pub fn member<V, F>(mut self, key: impl Into<String>, getter: F, scope: Scope<M, V>) -> Self
    where
        V: 'static,
        F: for<'a> Fn(&'a M) -> Option<&'a V> + Send + Sync + 'static,
    {
        self.slots.push(Slot::Member(Box::new(Member {
            key: key.into(),
            getter: Box::new(getter),
            scope,
        })));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Strategy;
    use crate::core::options::ValidationOptions;
    use crate::execution::repository::Repository;
    use crate::rules::RelativeRule;

    struct Account {
        email: Option<String>,
        password: Option<String>,
        confirm: Option<String>,
    }

    fn account_scope() -> ModelScope<Account> {
        ModelScope::builder()
            .member(
                "Email",
                |a: &Account| a.email.as_ref(),
                Scope::builder()
                    .must(|e: &String| e.contains('@'), "Must be an email")
                    .build()
                    .unwrap(),
            )
            .member(
                "Password",
                |a: &Account| a.password.as_ref(),
                Scope::builder()
                    .must(|p: &String| p.len() >= 8, "Too short")
                    .relative(
                        RelativeRule::new(|a: &Account| a.password == a.confirm)
                            .message("Passwords must match"),
                    )
                    .build()
                    .unwrap(),
            )
            .rules(
                Scope::builder()
                    .must(|a: &Account| a.email != a.password, "Email and password must differ")
                    .build()
                    .unwrap(),
            )
            .build()
    }

    fn run(account: &Account, strategy: Strategy) -> ErrorNode {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(strategy, &options, &repository);
        account_scope().evaluate(Some(account), &ctx).unwrap()
    }

    #[test]
    fn test_valid_model_produces_empty_tree() {
        let account = Account {
            email: Some("b@rt.com".to_string()),
            password: Some("correct horse".to_string()),
            confirm: Some("correct horse".to_string()),
        };
        assert!(run(&account, Strategy::Exhaustive).is_empty());
    }

    #[test]
    fn test_members_reported_under_their_keys() {
        let account = Account {
            email: Some("bart".to_string()),
            password: Some("short".to_string()),
            confirm: Some("other".to_string()),
        };
        let node = run(&account, Strategy::Exhaustive);
        assert_eq!(node.child("Email").unwrap().errors().len(), 1);
        let password: Vec<_> = node
            .child("Password")
            .unwrap()
            .errors()
            .iter()
            .map(|e| e.template())
            .collect();
        assert_eq!(password, vec!["Too short", "Passwords must match"]);
    }

    #[test]
    fn test_short_circuit_is_scoped_to_one_sequence() {
        let account = Account {
            email: Some("bart".to_string()),
            password: Some("short".to_string()),
            confirm: Some("other".to_string()),
        };
        let node = run(&account, Strategy::ShortCircuit);
        assert!(node.child("Email").is_some());
        assert_eq!(node.child("Password").unwrap().errors().len(), 1);
    }

    #[test]
    fn test_self_rules_attach_at_model_level() {
        let account = Account {
            email: Some("x@y.z1234".to_string()),
            password: Some("x@y.z1234".to_string()),
            confirm: Some("x@y.z1234".to_string()),
        };
        let node = run(&account, Strategy::Exhaustive);
        assert_eq!(node.errors().len(), 1);
        assert_eq!(node.errors()[0].template(), "Email and password must differ");
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_force_produces_full_catalog() {
        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Force, &options, &repository);
        let node = account_scope().evaluate(None, &ctx).unwrap();

        assert_eq!(node.errors().len(), 1);
        assert_eq!(node.child("Email").unwrap().errors().len(), 2);
        assert_eq!(node.child("Password").unwrap().errors().len(), 3);
        assert_eq!(node.error_count(), 6);
    }

    #[test]
    fn test_named_scope_overrides_member_key() {
        let scope = ModelScope::builder()
            .member(
                "email",
                |a: &Account| a.email.as_ref(),
                Scope::builder().named("EmailAddress").build().unwrap(),
            )
            .build();
        assert_eq!(scope.member_keys(), vec!["EmailAddress"]);

        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);
        let account = Account {
            email: None,
            password: None,
            confirm: None,
        };
        let node = scope.evaluate(Some(&account), &ctx).unwrap();
        assert!(node.child("EmailAddress").is_some());
        assert!(node.child("email").is_none());
    }

    #[test]
    fn test_same_key_twice_merges() {
        let scope = ModelScope::builder()
            .member(
                "Email",
                |a: &Account| a.email.as_ref(),
                Scope::builder().must(|e: &String| e.contains('@'), "No at").build().unwrap(),
            )
            .member(
                "Email",
                |a: &Account| a.email.as_ref(),
                Scope::builder().must(|e: &String| e.contains('.'), "No dot").build().unwrap(),
            )
            .build();

        let options = ValidationOptions::default();
        let repository = Repository::new();
        let ctx = ExecutionContext::new(Strategy::Exhaustive, &options, &repository);
        let account = Account {
            email: Some("bart".to_string()),
            password: None,
            confirm: None,
        };
        let node = scope.evaluate(Some(&account), &ctx).unwrap();
        let email: Vec<_> = node
            .child("Email")
            .unwrap()
            .errors()
            .iter()
            .map(|e| e.template())
            .collect();
        assert_eq!(email, vec!["No at", "No dot"]);
    }
}
