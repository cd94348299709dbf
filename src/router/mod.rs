//! # Router Module
//!
//! Path matching and route resolution for switchyard.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Splitting paths into segments ([`parse_pattern`])
//! - Validating and registering route patterns per HTTP method
//! - Matching incoming requests against a per-method segment trie
//! - Extracting `:name` and `*name` path parameters
//!
//! ## Pattern syntax
//!
//! | Segment  | Matches                                           |
//! |----------|---------------------------------------------------|
//! | `users`  | exactly `users`                                   |
//! | `:id`    | any single segment, bound to `id`                 |
//! | `*path`  | the rest of the path, joined by `/`, bound to `path` (final segment only) |
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use switchyard::dispatcher::{BoxedHandler, Context};
//! use switchyard::router::Router;
//!
//! let mut router = Router::new();
//! let handler: BoxedHandler = Arc::new(|ctx: &mut Context| ctx.string(200, "hi"));
//! router.add_route(Method::GET, "/hello/:name", handler).unwrap();
//!
//! let matched = router.match_route(&Method::GET, "/hello/abc").unwrap();
//! assert_eq!(&*matched.pattern, "/hello/:name");
//! assert_eq!(matched.params.get("name"), Some("abc"));
//! assert!(router.match_route(&Method::POST, "/hello/abc").is_none());
//! ```
//!
//! ## Match order
//!
//! Sibling segments are tried in registration order, not by specificity; see
//! [`trie`] for details.

mod core;
pub mod pattern;
pub mod trie;

pub use core::{ParamVec, PathParams, RouteError, RouteKey, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use pattern::{is_wild, parse_pattern, validate_pattern, PatternError, Segments, ROOT_SEGMENT};
pub use trie::TrieNode;
