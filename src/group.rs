//! Route groups: prefix scopes carrying their own middleware.
//!
//! Groups live in the [`Engine`]'s registry in creation order and are
//! addressed by [`GroupId`]. A [`RouterGroup`] is a short-lived handle that
//! borrows the engine mutably, so groups can only be created or extended
//! while the engine is still being set up.
//!
//! ```rust
//! use switchyard::{Context, Engine, Request};
//!
//! let mut engine = Engine::new();
//! {
//!     let mut v1 = engine.group("/v1");
//!     v1.use_middleware(|ctx: &mut Context| {
//!         ctx.set_header("x-api", "v1");
//!         ctx.next();
//!     });
//!     v1.get("/hello/:name", |ctx: &mut Context| {
//!         let name = ctx.param("name").unwrap_or_default().to_string();
//!         ctx.string(200, format!("hello {name}"));
//!     })
//!     .unwrap();
//! }
//!
//! let res = engine.handle(Request::get("/v1/hello/ferris"));
//! assert_eq!(res.body_text(), "hello ferris");
//! assert_eq!(res.header("x-api"), Some("v1"));
//! ```

use http::Method;
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::{BoxedHandler, Handler};
use crate::engine::Engine;
use crate::router::{RouteError, ROOT_SEGMENT};

/// Index of a group in the engine's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// The engine's default group, with an empty prefix
    pub const ROOT: GroupId = GroupId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Registry entry for one group.
pub(crate) struct GroupEntry {
    /// Concatenation of every ancestor prefix and this group's own
    pub(crate) prefix: String,
    /// `prefix` split like a path: root sentinel plus non-empty segments
    pub(crate) segments: Vec<String>,
    pub(crate) middlewares: Vec<BoxedHandler>,
    pub(crate) parent: Option<GroupId>,
}

impl GroupEntry {
    pub(crate) fn new(prefix: String, parent: Option<GroupId>) -> Self {
        let segments = std::iter::once(ROOT_SEGMENT)
            .chain(prefix.split('/').filter(|segment| !segment.is_empty()))
            .map(str::to_string)
            .collect();
        Self {
            prefix,
            segments,
            middlewares: Vec::new(),
            parent,
        }
    }

    /// Segment-wise prefix test against a parsed request path.
    ///
    /// `:name` in the group prefix accepts any one segment and `*name`
    /// accepts whatever remains.
    pub(crate) fn covers_segments(&self, path_parts: &[&str]) -> bool {
        for (position, segment) in self.segments.iter().enumerate() {
            if segment.starts_with('*') {
                return true;
            }
            let Some(part) = path_parts.get(position) else {
                return false;
            };
            if segment.starts_with(':') {
                continue;
            }
            if segment.as_str() != *part {
                return false;
            }
        }
        true
    }

    /// Raw string-prefix test.
    pub(crate) fn covers_prefix(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Generates `get`/`post`/... shortcuts over an `add_route` method with the
/// same signature on `RouterGroup` and `Engine`.
macro_rules! method_shortcuts {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<H>(&mut self, comp: &str, handler: H) -> Result<&mut Self, RouteError>
            where
                H: Handler + 'static,
            {
                self.add_route($method, comp, handler)
            }
        )*
    };
}
pub(crate) use method_shortcuts;

/// Mutable handle on one group of an [`Engine`].
pub struct RouterGroup<'e> {
    engine: &'e mut Engine,
    id: GroupId,
}

impl<'e> RouterGroup<'e> {
    pub(crate) fn new(engine: &'e mut Engine, id: GroupId) -> Self {
        Self { engine, id }
    }

    fn entry(&self) -> &GroupEntry {
        self.engine.group_entry(self.id)
    }

    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Full prefix, including every ancestor's.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.entry().prefix
    }

    #[must_use]
    pub fn parent(&self) -> Option<GroupId> {
        self.entry().parent
    }

    /// Create a nested group.
    ///
    /// The child's prefix is this group's prefix followed by `prefix`, as
    /// plain string concatenation; include the leading slash.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let id = self.engine.create_group(self.id, prefix);
        RouterGroup::new(&mut *self.engine, id)
    }

    /// Append a middleware. Middleware run in the order they were added.
    pub fn use_middleware<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.use_boxed(Arc::new(handler))
    }

    /// Append an already shared middleware.
    pub fn use_boxed(&mut self, handler: BoxedHandler) -> &mut Self {
        self.engine.group_entry_mut(self.id).middlewares.push(handler);
        self
    }

    /// Number of middleware attached directly to this group.
    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.entry().middlewares.len()
    }

    /// Register `handler` under `prefix + comp`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the combined pattern is
    /// malformed.
    pub fn add_route<H>(
        &mut self,
        method: Method,
        comp: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler + 'static,
    {
        self.add_route_boxed(method, comp, Arc::new(handler))
    }

    /// [`RouterGroup::add_route`] for an already shared handler.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the combined pattern is
    /// malformed.
    pub fn add_route_boxed(
        &mut self,
        method: Method,
        comp: &str,
        handler: BoxedHandler,
    ) -> Result<&mut Self, RouteError> {
        let pattern = format!("{}{}", self.prefix(), comp);
        debug!("Route {:>4} - {}", method.as_str(), pattern);
        self.engine.router_mut().add_route(method, &pattern, handler)?;
        Ok(self)
    }

    method_shortcuts! {
        /// Register a `GET` route
        get => Method::GET;
        /// Register a `POST` route
        post => Method::POST;
        /// Register a `PUT` route
        put => Method::PUT;
        /// Register a `DELETE` route
        delete => Method::DELETE;
        /// Register a `PATCH` route
        patch => Method::PATCH;
        /// Register a `HEAD` route
        head => Method::HEAD;
        /// Register an `OPTIONS` route
        options => Method::OPTIONS;
    }
}
