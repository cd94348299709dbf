//! Dispatch engine: owns the router and the group registry and turns each
//! request into a handler chain.
//!
//! Per request the engine:
//! 1. collects, in group-creation order, the middleware of every group whose
//!    prefix covers the path (see [`GroupMatching`]);
//! 2. matches the route and appends exactly one terminal handler: the route
//!    handler, the "running" handler for an unrouted `/`, or the not-found
//!    handler;
//! 3. runs the chain through [`Context::next`] and returns the response.
//!
//! Registration methods take `&mut self` and [`Engine::handle`] takes
//! `&self`, so once an engine is shared between worker threads (for example
//! behind an `Arc`) its routes and groups are frozen.

use http::Method;
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::{BoxedHandler, Context, Handler, Request, Response};
use crate::group::{method_shortcuts, GroupEntry, GroupId, RouterGroup};
use crate::middleware::{RecoveryMiddleware, TracingMiddleware};
use crate::router::{parse_pattern, RouteError, Router, ROOT_SEGMENT};
use crate::runtime_config::{GroupMatching, RuntimeConfig};

/// Body of the default root response.
pub const RUNNING_MESSAGE: &str = "web service is running.";
/// Body of the default not-found response.
pub const NOT_FOUND_MESSAGE: &str = "404 NOT FOUND";

fn running_handler(ctx: &mut Context) {
    ctx.string(200, RUNNING_MESSAGE);
}

fn not_found_handler(ctx: &mut Context) {
    ctx.string(404, NOT_FOUND_MESSAGE);
}

/// The routing and dispatch core.
pub struct Engine {
    router: Router,
    /// Group registry in creation order; index 0 is the default group
    groups: Vec<GroupEntry>,
    config: RuntimeConfig,
    running: BoxedHandler,
    not_found: BoxedHandler,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with no middleware and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            router: Router::new(),
            groups: vec![GroupEntry::new(String::new(), None)],
            config,
            running: Arc::new(running_handler),
            not_found: Arc::new(not_found_handler),
        }
    }

    /// Engine with [`RecoveryMiddleware`] and [`TracingMiddleware`] installed
    /// on the default group, in that order.
    #[must_use]
    pub fn with_default_middleware() -> Self {
        let mut engine = Self::new();
        engine
            .use_middleware(RecoveryMiddleware)
            .use_middleware(TracingMiddleware);
        engine
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub(crate) fn group_entry(&self, id: GroupId) -> &GroupEntry {
        &self.groups[id.0]
    }

    pub(crate) fn group_entry_mut(&mut self, id: GroupId) -> &mut GroupEntry {
        &mut self.groups[id.0]
    }

    /// Register a child of `parent` and return its id.
    pub(crate) fn create_group(&mut self, parent: GroupId, prefix: &str) -> GroupId {
        let full_prefix = format!("{}{}", self.group_entry(parent).prefix, prefix);
        debug!(prefix = %full_prefix, parent = parent.0, "group created");
        self.groups.push(GroupEntry::new(full_prefix, Some(parent)));
        GroupId(self.groups.len() - 1)
    }

    /// Handle on the default group (empty prefix).
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup::new(self, GroupId::ROOT)
    }

    /// Create a top-level group.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let id = self.create_group(GroupId::ROOT, prefix);
        RouterGroup::new(self, id)
    }

    /// Handle on an existing group.
    pub fn group_mut(&mut self, id: GroupId) -> Option<RouterGroup<'_>> {
        if id.0 < self.groups.len() {
            Some(RouterGroup::new(self, id))
        } else {
            None
        }
    }

    /// Ids and full prefixes of all groups, in creation order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &str)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(index, entry)| (GroupId(index), entry.prefix.as_str()))
    }

    /// Append a middleware to the default group; it applies to every request.
    pub fn use_middleware<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.use_boxed(Arc::new(handler))
    }

    pub fn use_boxed(&mut self, handler: BoxedHandler) -> &mut Self {
        self.group_entry_mut(GroupId::ROOT).middlewares.push(handler);
        self
    }

    /// Replace the terminal handler used when no route matches.
    pub fn no_route<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.not_found = Arc::new(handler);
        self
    }

    /// Register a route on the default group.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the pattern is malformed.
    pub fn add_route<H>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler + 'static,
    {
        self.root().add_route(method, pattern, handler)?;
        Ok(self)
    }

    method_shortcuts! {
        /// Register a `GET` route on the default group
        get => Method::GET;
        /// Register a `POST` route on the default group
        post => Method::POST;
        /// Register a `PUT` route on the default group
        put => Method::PUT;
        /// Register a `DELETE` route on the default group
        delete => Method::DELETE;
        /// Register a `PATCH` route on the default group
        patch => Method::PATCH;
        /// Register a `HEAD` route on the default group
        head => Method::HEAD;
        /// Register an `OPTIONS` route on the default group
        options => Method::OPTIONS;
    }

    /// Middleware that apply to `path`, in group-creation order.
    #[must_use]
    pub fn middleware_for(&self, path: &str) -> Vec<BoxedHandler> {
        let path_parts = parse_pattern(path);
        self.groups
            .iter()
            .filter(|group| match self.config.group_matching {
                GroupMatching::Segments => group.covers_segments(&path_parts),
                GroupMatching::Prefix => group.covers_prefix(path),
            })
            .flat_map(|group| group.middlewares.iter().map(Arc::clone))
            .collect()
    }

    /// Dispatch one request through the matching middleware and handler.
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        let mut ctx = Context::new(request);
        debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            request_id = %ctx.request_id(),
            "dispatching request"
        );

        let mut chain = self.middleware_for(ctx.path());
        match self.router.match_route(ctx.method(), ctx.path()) {
            Some(matched) => {
                ctx.set_route(matched.pattern, matched.params);
                chain.push(matched.handler);
            }
            None if self.config.root_fallback && ctx.path() == ROOT_SEGMENT => {
                chain.push(Arc::clone(&self.running));
            }
            None => chain.push(Arc::clone(&self.not_found)),
        }

        ctx.set_handlers(chain);
        ctx.next();
        ctx.into_response()
    }
}
