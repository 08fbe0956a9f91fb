//! The hierarchical error tree produced by a validation call.

use crate::core::error::ValidationError;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// A node of the error tree.
///
/// Each node owns the errors reported directly at its location and an ordered
/// map of child nodes keyed by member name, collection index, or the force key.
/// Trees are built forward-only: errors and children can be added, never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorNode {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<Arc<ValidationError>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    children: IndexMap<String, ErrorNode>,
}

impl ErrorNode {
    /// Create a new empty node. Empty nodes do not allocate.
    pub fn new() -> Self {
        Self::default()
    }

    /// A node is empty iff it has no own errors and no children.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.is_empty()
    }

    /// Errors attached directly to this node.
    pub fn errors(&self) -> &[Arc<ValidationError>] {
        &self.errors
    }

    /// Child nodes in insertion order.
    pub fn children(&self) -> &IndexMap<String, ErrorNode> {
        &self.children
    }

    /// Get a direct child.
    pub fn child(&self, key: &str) -> Option<&ErrorNode> {
        self.children.get(key)
    }

    /// Navigate to a descendant through a sequence of keys.
    pub fn path(&self, keys: &[&str]) -> Option<&ErrorNode> {
        keys.iter().try_fold(self, |node, key| node.child(key))
    }

    /// Append an error to this node's own list.
    pub fn add_error(&mut self, error: Arc<ValidationError>) {
        self.errors.push(error);
    }

    /// Attach `child` under `key`.
    ///
    /// Empty children are dropped. If `key` already exists the existing node is
    /// extended with the child's errors and children.
    pub fn attach(&mut self, key: impl Into<String>, child: ErrorNode) {
        if child.is_empty() {
            return;
        }
        let key = key.into();
        match self.children.get_mut(&key) {
            Some(existing) => existing.merge(child),
            None => {
                self.children.insert(key, child);
            }
        }
    }

    /// Merge another node into this one at the same level.
    pub fn merge(&mut self, other: ErrorNode) {
        self.errors.extend(other.errors);
        for (key, child) in other.children {
            self.attach(key, child);
        }
    }

    /// Replace this node's own errors with a single summary error.
    ///
    /// Children are left untouched.
    pub(crate) fn collapse_errors(&mut self, summary: Arc<ValidationError>) {
        self.errors.clear();
        self.errors.push(summary);
    }

    /// Total number of errors in this node and all descendants.
    pub fn error_count(&self) -> usize {
        self.errors.len()
            + self
                .children
                .values()
                .map(ErrorNode::error_count)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(template: &str) -> Arc<ValidationError> {
        ValidationError::shared(template)
    }

    #[test]
    fn test_new_node_is_empty() {
        assert!(ErrorNode::new().is_empty());
        assert_eq!(ErrorNode::new(), ErrorNode::default());
    }

    #[test]
    fn test_attach_empty_child_is_noop() {
        let mut node = ErrorNode::new();
        node.attach("Email", ErrorNode::new());
        assert!(node.is_empty());
        assert!(node.child("Email").is_none());
    }

    #[test]
    fn test_attach_existing_key_extends() {
        let mut first = ErrorNode::new();
        first.add_error(error("Too short"));
        let mut nested = ErrorNode::new();
        nested.add_error(error("Bad host"));
        first.attach("Host", nested);

        let mut second = ErrorNode::new();
        second.add_error(error("Bad format"));
        let mut nested = ErrorNode::new();
        nested.add_error(error("Unknown host"));
        second.attach("Host", nested);

        let mut root = ErrorNode::new();
        root.attach("Email", first);
        root.attach("Email", second);

        let email = root.child("Email").unwrap();
        let own: Vec<_> = email.errors().iter().map(|e| e.template()).collect();
        assert_eq!(own, vec!["Too short", "Bad format"]);

        let host: Vec<_> = root
            .path(&["Email", "Host"])
            .unwrap()
            .errors()
            .iter()
            .map(|e| e.template())
            .collect();
        assert_eq!(host, vec!["Bad host", "Unknown host"]);
        assert_eq!(root.error_count(), 4);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut root = ErrorNode::new();
        for key in ["b", "a", "c"] {
            let mut child = ErrorNode::new();
            child.add_error(error("x"));
            root.attach(key, child);
        }
        let keys: Vec<_> = root.children().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_collapse_keeps_children() {
        let mut node = ErrorNode::new();
        node.add_error(error("one"));
        node.add_error(error("two"));
        let mut child = ErrorNode::new();
        child.add_error(error("nested"));
        node.attach("Inner", child);

        node.collapse_errors(error("summary"));
        assert_eq!(node.errors().len(), 1);
        assert_eq!(node.errors()[0].template(), "summary");
        assert!(node.child("Inner").is_some());
    }

    #[test]
    fn test_serializes_without_empty_fields() {
        let mut root = ErrorNode::new();
        let mut child = ErrorNode::new();
        child.add_error(error("Required"));
        root.attach("Name", child);

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "children": { "Name": { "errors": [ { "template": "Required" } ] } } })
        );
    }
}
