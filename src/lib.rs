//! # Ambit - Rule-tree Validation
//!
//! Ambit validates in-memory object graphs against declarative rule trees and
//! reports failures as a hierarchical error tree that mirrors the model.
//!
//! ## Features
//!
//! - **Rule Trees**: Scopes hold ordered rule sequences for a model or one of its members
//! - **Strategies**: Exhaustive, short-circuit, or forced evaluation of every rule
//! - **Nested Models**: Recursive validation with a depth guard against cycles
//! - **Collections**: Per-element validation with errors keyed by index
//! - **Repository**: Lazily built, memoized scopes shared across threads
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ambit::prelude::*;
//!
//! struct Signup {
//!     username: Option<String>,
//!     email: Option<String>,
//! }
//!
//! let validator = Validator::new();
//! validator.register(|| {
//!     Ok(ModelScope::builder()
//!         .member(
//!             "Username",
//!             |s: &Signup| s.username.as_ref(),
//!             Scope::builder()
//!                 .required_message("Please provide the username")
//!                 .build()?,
//!         )
//!         .member(
//!             "Email",
//!             |s: &Signup| s.email.as_ref(),
//!             Scope::builder()
//!                 .must(|e: &String| e.contains('@'), "Must be a valid email")
//!                 .build()?,
//!         )
//!         .build())
//! });
//!
//! let signup = Signup { username: None, email: Some("bart".to_string()) };
//! let report = validator.report(&signup, Strategy::Exhaustive)?;
//! println!("{}", report.to_text());
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`core`]: Errors, the error tree, options, and the execution context
//! - [`rules`]: The rule variants a scope is made of
//! - [`scope`]: Rule sequences and whole-model scopes
//! - [`execution`]: The validator front end and the scope repository

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod rules;
pub mod scope;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use ambit::prelude::*;
/// ```
pub mod prelude {
    // Errors and reports
    pub use crate::core::error::{Argument, EngineError, EngineResult, ValidationError};
    pub use crate::core::report::{Report, ReportLine};
    pub use crate::core::tree::ErrorNode;

    // Options and context
    pub use crate::core::context::{ExecutionContext, Strategy};
    pub use crate::core::options::ValidationOptions;

    // Rules
    pub use crate::rules::{
        CollectionRule, ModelRule, NullableRule, RelativeRule, Rule, ScopeProducer, ValueRule,
    };

    // Scopes
    pub use crate::scope::{ModelScope, ModelScopeBuilder, Scope, ScopeBuilder};

    // Execution
    pub use crate::execution::engine::{Specification, Validator};
    pub use crate::execution::repository::{Repository, RepositoryKey, RepositoryStats};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
