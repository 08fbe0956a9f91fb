//! Evaluation strategy and the execution context threaded through every rule.

use crate::core::error::{EngineError, EngineResult, ValidationError};
use crate::core::options::ValidationOptions;
use crate::execution::repository::Repository;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How many rules of a sequence run, and whether predicates run at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every rule of every sequence is evaluated.
    #[default]
    Exhaustive,
    /// A sequence stops at its first failing rule or element.
    ShortCircuit,
    /// No predicate runs; every rule reports its error as if it had failed.
    Force,
}

impl Strategy {
    /// Whether predicates are skipped and every error is emitted.
    pub fn is_force(self) -> bool {
        self == Strategy::Force
    }

    /// Whether a sequence stops after its first failure.
    pub fn stops_on_first_error(self) -> bool {
        self == Strategy::ShortCircuit
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Exhaustive => "exhaustive",
            Strategy::ShortCircuit => "short-circuit",
            Strategy::Force => "force",
        };
        f.write_str(name)
    }
}

/// Context passed down every recursive evaluation step.
///
/// The context is immutable; descending into a nested model or collection
/// produces a copy with the depth incremented by one.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    strategy: Strategy,
    options: &'a ValidationOptions,
    repository: &'a Repository,
    depth: usize,
}

impl<'a> ExecutionContext<'a> {
    /// Create a root context at depth zero.
    pub fn new(
        strategy: Strategy,
        options: &'a ValidationOptions,
        repository: &'a Repository,
    ) -> Self {
        Self {
            strategy,
            options,
            repository,
            depth: 0,
        }
    }

    /// Start from an explicit depth.
    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// The active strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Shorthand for `strategy().is_force()`.
    pub fn is_force(&self) -> bool {
        self.strategy.is_force()
    }

    /// The global options.
    pub fn options(&self) -> &'a ValidationOptions {
        self.options
    }

    /// The repository used to resolve nested models by type or key.
    pub fn repository(&self) -> &'a Repository {
        self.repository
    }

    /// Current recursion depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The default Required error.
    pub fn required_error(&self) -> &'a Arc<ValidationError> {
        &self.options.required_error
    }

    /// The error emitted by rules without a configured error.
    pub fn default_error(&self) -> &'a Arc<ValidationError> {
        &self.options.default_error
    }

    /// Key for forced collection results.
    pub fn force_key(&self) -> &'a str {
        &self.options.force_key
    }

    /// Context for one nested descent.
    ///
    /// Fails once the new depth exceeds the configured maximum.
    pub fn descend(&self) -> EngineResult<Self> {
        let depth = self.depth + 1;
        if depth > self.options.max_depth {
            log::debug!(
                "aborting validation: depth {} exceeds max depth {}",
                depth,
                self.options.max_depth
            );
            return Err(EngineError::MaxDepthExceeded {
                depth,
                max_depth: self.options.max_depth,
            });
        }
        log::trace!("descending to depth {}", depth);
        Ok(Self { depth, ..*self })
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("strategy", &self.strategy)
            .field("options", &self.options)
            .field("repository", &"<repository>")
            .field("depth", &self.depth)
            .finish()
    }
}
