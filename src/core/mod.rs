//! Core types shared by rules, scopes, and the repository.
//!
//! This module contains:
//! - Validation errors and engine faults
//! - The error tree and its flattened report
//! - Global options
//! - Strategy and execution context

pub mod context;
pub mod error;
pub mod options;
pub mod report;
pub mod tree;

// Re-export commonly used types
pub use context::{ExecutionContext, Strategy};
pub use error::{Argument, EngineError, EngineResult, ValidationError};
pub use options::ValidationOptions;
pub use report::{Report, ReportLine};
pub use tree::ErrorNode;
