//! Segment trie used for per-method route matching.
//!
//! Each [`TrieNode`] represents one path segment. A node carries the full
//! registration pattern only when a route terminates on it; intermediate
//! nodes never do.
//!
//! ## Match order
//!
//! Children are kept in the order they were first inserted and search tries
//! every compatible child (exact segment or wildcard) depth-first in that
//! order. The first branch that ends on a terminal node wins. This means a
//! parametric route registered before a static sibling shadows it:
//!
//! ```text
//! GET /hello/:name   (registered first)
//! GET /hello/abc
//!
//! GET /hello/abc  ->  /hello/:name  { name: "abc" }
//! ```
//!
//! There is deliberately no "most specific wins" ranking.

use std::sync::Arc;

use super::pattern::is_wild;

/// One node of a routing trie.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    /// Segment text for this node, e.g. `users`, `:id` or `*path`
    part: String,
    /// Registration pattern, set only on the node that terminates a route
    pattern: Option<Arc<str>>,
    /// Children in first-seen order
    children: Vec<TrieNode>,
    /// `part` starts with `:` or `*`
    is_wild: bool,
}

impl TrieNode {
    /// Create a node for a single segment.
    #[must_use]
    pub fn new(part: &str) -> Self {
        Self {
            part: part.to_string(),
            pattern: None,
            children: Vec::new(),
            is_wild: is_wild(part),
        }
    }

    /// Segment text of this node.
    #[must_use]
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Full pattern of the route terminating here, if any.
    #[must_use]
    pub fn pattern(&self) -> Option<&Arc<str>> {
        self.pattern.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[TrieNode] {
        &self.children
    }

    #[must_use]
    pub fn is_wild(&self) -> bool {
        self.is_wild
    }

    /// Insert the route whose parsed segments are `parts`, descending from
    /// `height`. The caller has already consumed `parts[..height]`; the
    /// router starts at 1 because the root sentinel is this node.
    ///
    /// Returns the pattern previously stored on the terminal node, if the
    /// route (or another spelling of it, like a trailing slash) existed.
    pub fn insert(
        &mut self,
        pattern: &Arc<str>,
        parts: &[&str],
        height: usize,
    ) -> Option<Arc<str>> {
        let Some(part) = parts.get(height) else {
            return self.pattern.replace(Arc::clone(pattern));
        };

        let index = match self.children.iter().position(|child| child.part == *part) {
            Some(index) => index,
            None => {
                self.children.push(TrieNode::new(part));
                self.children.len() - 1
            }
        };
        self.children[index].insert(pattern, parts, height + 1)
    }

    /// Find the terminal node matching `parts`, descending from `height`.
    ///
    /// A `*` node swallows every remaining segment. A node reached with all
    /// segments consumed only matches if a route terminates on it.
    #[must_use]
    pub fn search(&self, parts: &[&str], height: usize) -> Option<&TrieNode> {
        if parts.len() == height || self.part.starts_with('*') {
            return self.pattern.as_ref().map(|_| self);
        }

        let part = parts.get(height)?;
        self.children
            .iter()
            .filter(|child| child.part == *part || child.is_wild)
            .find_map(|child| child.search(parts, height + 1))
    }

    /// Number of terminal nodes at or below this one.
    #[must_use]
    pub fn route_count(&self) -> usize {
        usize::from(self.pattern.is_some())
            + self
                .children
                .iter()
                .map(TrieNode::route_count)
                .sum::<usize>()
    }
}
