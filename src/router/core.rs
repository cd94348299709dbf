//! Router core module - hot path for request routing.
//!
//! One [`TrieNode`] per HTTP method, lazily created on first registration,
//! plus a handler table keyed by [`RouteKey`].

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::pattern::{parse_pattern, validate_pattern, PatternError, ROOT_SEGMENT};
use super::trie::TrieNode;
use crate::dispatcher::BoxedHandler;

/// Maximum number of path parameters before heap allocation.
/// Most routes bind at most a handful (e.g. `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// Path parameters extracted from a matched request.
///
/// Names are unique: inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(ParamVec);

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: &str, value: String) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert to a HashMap.
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.0.iter().cloned().collect()
    }
}

/// Typed handler-table key.
///
/// Keeping method and pattern apart means no separator can make two distinct
/// routes collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub pattern: Arc<str>,
}

impl RouteKey {
    #[must_use]
    pub fn new(method: Method, pattern: &str) -> Self {
        Self {
            method,
            pattern: Arc::from(pattern),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

/// Route registration failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern failed validation; nothing was registered
    InvalidPattern {
        method: Method,
        pattern: String,
        reason: PatternError,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern {
                method,
                pattern,
                reason,
            } => write!(f, "invalid route {method} '{pattern}': {reason}"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidPattern { reason, .. } => Some(reason),
        }
    }
}

/// Result of successfully matching a request to a route
#[derive(Clone)]
pub struct RouteMatch {
    /// The registration pattern of the matched route (e.g. `/hello/:name`)
    pub pattern: Arc<str>,
    /// Path parameters bound by the pattern
    pub params: PathParams,
    /// Handler registered for the route
    pub handler: BoxedHandler,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Method-keyed routing tries plus the handler table.
///
/// Registration needs `&mut self`; matching only `&self`, so a router that
/// has been shared for serving can no longer change.
#[derive(Clone, Default)]
pub struct Router {
    roots: HashMap<Method, TrieNode>,
    handlers: HashMap<RouteKey, BoxedHandler>,
    /// Registration order, used for listing
    order: Vec<RouteKey>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// Registering the same method and pattern again replaces the earlier
    /// handler and logs a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the pattern is malformed;
    /// the router is left unchanged.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(), RouteError> {
        validate_pattern(pattern).map_err(|reason| RouteError::InvalidPattern {
            method: method.clone(),
            pattern: pattern.to_string(),
            reason,
        })?;

        let parts = parse_pattern(pattern);
        let key = RouteKey::new(method.clone(), pattern);
        let root = self
            .roots
            .entry(method)
            .or_insert_with(|| TrieNode::new(parts.first().copied().unwrap_or(ROOT_SEGMENT)));
        let previous = root.insert(&key.pattern, &parts, 1);

        // Same segments under another spelling (e.g. `/a` vs `/a/`): the trie
        // node now answers to the new pattern, so drop the stale handler.
        if let Some(previous) = previous.filter(|previous| previous.as_ref() != pattern) {
            let stale = RouteKey {
                method: key.method.clone(),
                pattern: previous,
            };
            self.handlers.remove(&stale);
            self.order.retain(|existing| *existing != stale);
            warn!(route = %key, replaced = %stale, "route replaces an equivalent pattern");
        }

        if self.handlers.insert(key.clone(), handler).is_some() {
            warn!(route = %key, "route registered twice, replacing previous handler");
        } else {
            debug!(route = %key, "route registered");
            self.order.push(key);
        }
        Ok(())
    }

    /// Match a request to a route.
    ///
    /// Returns `None` when the method has no routes or no route matches.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let root = self.roots.get(method)?;
        let path_parts = parse_pattern(path);
        let node = root.search(&path_parts, 1)?;
        let pattern = node.pattern()?;

        let key = RouteKey {
            method: method.clone(),
            pattern: Arc::clone(pattern),
        };
        let Some(handler) = self.handlers.get(&key) else {
            warn!(route = %key, "trie terminal has no handler");
            return None;
        };

        Some(RouteMatch {
            pattern: Arc::clone(pattern),
            params: extract_params(pattern, &path_parts, path),
            handler: Arc::clone(handler),
        })
    }

    /// Registered routes, grouped by method in first-registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteKey> {
        let mut routes = self.order.clone();
        routes.sort_by(|a, b| a.method.as_str().cmp(b.method.as_str()));
        routes
    }

    /// Number of registered (method, pattern) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Root trie node for `method`, if any route uses it.
    #[must_use]
    pub fn root(&self, method: &Method) -> Option<&TrieNode> {
        self.roots.get(method)
    }
}

/// Walk the matched pattern in lockstep with the request path and bind
/// `:name` segments and the `*name` tail.
fn extract_params(pattern: &str, path_parts: &[&str], path: &str) -> PathParams {
    let mut params = PathParams::new();
    for (index, part) in parse_pattern(pattern).iter().enumerate() {
        if let Some(name) = part.strip_prefix(':') {
            if let Some(value) = path_parts.get(index) {
                params.insert(name, (*value).to_string());
            }
        } else if let Some(name) = part.strip_prefix('*') {
            if !name.is_empty() && path.len() > 1 {
                if let Some(tail) = path_parts.get(index..) {
                    params.insert(name, tail.join("/"));
                }
            }
            break;
        }
    }
    params
}
