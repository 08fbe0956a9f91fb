//! Execution module.
//!
//! This module runs model scopes and caches them per type.

pub mod engine;
pub mod repository;

pub use engine::{Specification, Validator};
pub use repository::{Repository, RepositoryKey, RepositoryStats, SharedRepository};
