//! Flattened, human-readable view of an error tree.

use crate::core::tree::ErrorNode;
use serde::Serialize;
use std::fmt;

/// One rendered error and the path of the node it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// Keys from the root joined with `.`; empty for root-level errors.
    pub path: String,
    /// Rendered message.
    pub message: String,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl ErrorNode {
    /// Flatten the tree depth-first: own errors first, then children in order.
    pub fn flatten(&self) -> Vec<ReportLine> {
        let mut lines = Vec::new();
        flatten_into(self, String::new(), &mut lines);
        lines
    }
}

fn flatten_into(node: &ErrorNode, path: String, lines: &mut Vec<ReportLine>) {
    for error in node.errors() {
        lines.push(ReportLine {
            path: path.clone(),
            message: error.render(),
        });
    }
    for (key, child) in node.children() {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        flatten_into(child, child_path, lines);
    }
}

/// Result of a validation call, ready for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Root of the error tree.
    pub root: ErrorNode,
}

impl Report {
    /// Wrap a root node.
    pub fn new(root: ErrorNode) -> Self {
        Self { root }
    }

    /// Whether no rule failed.
    pub fn is_valid(&self) -> bool {
        self.root.is_empty()
    }

    /// Total number of errors in the tree.
    pub fn error_count(&self) -> usize {
        self.root.error_count()
    }

    /// All errors as flat lines.
    pub fn lines(&self) -> Vec<ReportLine> {
        self.root.flatten()
    }

    /// One `path: message` line per error.
    pub fn to_text(&self) -> String {
        self.lines()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            "✓ Model is valid".to_string()
        } else {
            format!("✗ Validation failed with {} error(s)", self.error_count())
        }
    }
}

impl From<ErrorNode> for Report {
    fn from(root: ErrorNode) -> Self {
        Self::new(root)
    }
}
