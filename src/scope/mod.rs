//! Scopes group rules by location in the model graph.
//!
//! A [`Scope`] is one ordered rule sequence with its modifiers. A [`ModelScope`]
//! is the complete rule tree of a type: self scopes and member scopes.

pub mod model;
pub mod sequence;

pub use model::{Getter, ModelScope, ModelScopeBuilder};
pub use sequence::{Scope, ScopeBuilder};
