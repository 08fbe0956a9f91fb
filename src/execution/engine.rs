//! Validation entry points.
//!
//! A [`Specification`] is one prepared run: a model scope, an optional model and
//! the context to evaluate it in. The [`Validator`] owns options and a shared
//! repository and builds specifications for callers.

use crate::core::context::{ExecutionContext, Strategy};
use crate::core::error::EngineResult;
use crate::core::options::ValidationOptions;
use crate::core::report::Report;
use crate::core::tree::ErrorNode;
use crate::execution::repository::{Repository, RepositoryKey};
use crate::scope::ModelScope;
use std::sync::Arc;
use std::time::Instant;

/// One prepared validation run.
pub struct Specification<'a, M> {
    scope: Arc<ModelScope<M>>,
    model: Option<&'a M>,
    context: ExecutionContext<'a>,
}

impl<'a, M: 'static> Specification<'a, M> {
    /// Validate `model` in `context`.
    pub fn new(scope: Arc<ModelScope<M>>, model: &'a M, context: ExecutionContext<'a>) -> Self {
        Self {
            scope,
            model: Some(model),
            context,
        }
    }

    /// Produce the full error catalog of `scope` without a model.
    pub fn forced(
        scope: Arc<ModelScope<M>>,
        options: &'a ValidationOptions,
        repository: &'a Repository,
    ) -> Self {
        Self {
            scope,
            model: None,
            context: ExecutionContext::new(Strategy::Force, options, repository),
        }
    }

    /// The context the run starts in.
    pub fn context(&self) -> &ExecutionContext<'a> {
        &self.context
    }

    /// Evaluate the scope and return the error tree.
    ///
    /// An empty tree means the model is valid. Faults abort the whole run and
    /// no partial tree is returned.
    pub fn run(&self) -> EngineResult<ErrorNode> {
        let start = Instant::now();
        log::debug!(
            "validating {} ({} strategy, depth {})",
            std::any::type_name::<M>(),
            self.context.strategy(),
            self.context.depth()
        );

        let result = self.scope.evaluate(self.model, &self.context);

        match &result {
            Ok(node) => log::debug!(
                "validated {} in {:?}: {} error(s)",
                std::any::type_name::<M>(),
                start.elapsed(),
                node.error_count()
            ),
            Err(err) => log::debug!(
                "validation of {} aborted after {:?}: {}",
                std::any::type_name::<M>(),
                start.elapsed(),
                err
            ),
        }
        result
    }
}

/// Validation front end: options plus a repository of model scopes.
///
/// Cloning a validator shares its repository.
#[derive(Debug, Clone)]
pub struct Validator {
    options: ValidationOptions,
    repository: Arc<Repository>,
}

impl Validator {
    /// Create a validator with default options and an empty repository.
    pub fn new() -> Self {
        Self {
            options: ValidationOptions::default(),
            repository: Arc::new(Repository::new()),
        }
    }

    /// Create a validator with checked options.
    pub fn with_options(options: ValidationOptions) -> EngineResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            repository: Arc::new(Repository::new()),
        })
    }

    /// Use a shared repository.
    pub fn with_repository(mut self, repository: Arc<Repository>) -> Self {
        self.repository = repository;
        self
    }

    /// The options in use.
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// The repository nested models are resolved from.
    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }

    /// Register the producer of `T`'s scope.
    pub fn register<T, F>(&self, producer: F)
    where
        T: 'static,
        F: Fn() -> EngineResult<ModelScope<T>> + Send + Sync + 'static,
    {
        self.repository.register(producer);
    }

    /// Validate `model` with the scope registered for `M`.
    ///
    /// The scope's depth is checked once per repository at the configured
    /// `max_depth`; a scope that is too deep (or cyclic) faults even for shallow data.
    pub fn validate<M: 'static>(&self, model: &M, strategy: Strategy) -> EngineResult<ErrorNode> {
        let scope = self.repository.get::<M>()?;
        self.check_schema(Some(RepositoryKey::of::<M>()), &scope)?;
        self.run(scope, model, strategy)
    }

    /// Validate `model` with an explicit scope.
    ///
    /// The scope is not cached, so its depth is checked on every call.
    pub fn validate_with<M: 'static>(
        &self,
        scope: impl Into<Arc<ModelScope<M>>>,
        model: &M,
        strategy: Strategy,
    ) -> EngineResult<ErrorNode> {
        let scope = scope.into();
        self.check_schema(None, &scope)?;
        self.run(scope, model, strategy)
    }

    fn run<M: 'static>(
        &self,
        scope: Arc<ModelScope<M>>,
        model: &M,
        strategy: Strategy,
    ) -> EngineResult<ErrorNode> {
        let context = ExecutionContext::new(strategy, &self.options, &self.repository);
        Specification::new(scope, model, context).run()
    }

    /// Force dry-run of `scope`, so depth faults do not depend on the data.
    fn check_schema<M: 'static>(
        &self,
        key: Option<RepositoryKey>,
        scope: &Arc<ModelScope<M>>,
    ) -> EngineResult<()> {
        if !self.options.schema_check {
            return Ok(());
        }
        let max_depth = self.options.max_depth;
        if let Some(key) = &key {
            if self.repository.is_checked(key, max_depth) {
                return Ok(());
            }
        }

        Specification::forced(scope.clone(), &self.options, &self.repository).run()?;

        if let Some(key) = key {
            log::debug!("schema of '{}' passed depth check at max depth {}", key, max_depth);
            self.repository.mark_checked(key, max_depth);
        }
        Ok(())
    }

    /// Produce every error the scope registered for `M` can emit.
    pub fn force<M: 'static>(&self) -> EngineResult<ErrorNode> {
        let scope = self.repository.get::<M>()?;
        self.force_with(scope)
    }

    /// Produce every error an explicit scope can emit.
    pub fn force_with<M: 'static>(&self, scope: impl Into<Arc<ModelScope<M>>>) -> EngineResult<ErrorNode> {
        Specification::forced(scope.into(), &self.options, &self.repository).run()
    }

    /// Whether `model` passes, stopping each sequence at its first failure.
    pub fn is_valid<M: 'static>(&self, model: &M) -> EngineResult<bool> {
        Ok(self.validate(model, Strategy::ShortCircuit)?.is_empty())
    }

    /// Validate `model` and wrap the tree in a [`Report`].
    pub fn report<M: 'static>(&self, model: &M, strategy: Strategy) -> EngineResult<Report> {
        self.validate(model, strategy).map(Report::new)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
