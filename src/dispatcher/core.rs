//! Dispatcher core module - per-request state and chain execution.
//!
//! A [`Context`] is created for every request. It owns the request, the
//! extracted path parameters, the ordered handler chain and a cursor into
//! it, plus an in-memory [`Response`] record that handlers write to.

use http::Method;
use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::router::PathParams;

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because they are usually static strings
/// repeated across requests; values are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

pub const MIME_TEXT: &str = "text/plain;charset=utf-8";
pub const MIME_JSON: &str = "application/json;charset=utf-8";
pub const MIME_HTML: &str = "text/html;charset=utf-8";

/// A unit of work in the request chain: middleware and route handlers alike.
///
/// Implemented for every `Fn(&mut Context) + Send + Sync`, so plain closures
/// work:
///
/// ```rust
/// use switchyard::dispatcher::{Context, Handler};
///
/// fn takes_handler<H: Handler>(_h: H) {}
/// takes_handler(|ctx: &mut Context| ctx.string(200, "ok"));
/// ```
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        self(ctx)
    }
}

/// Shared, type-erased handler as stored in routers and groups.
pub type BoxedHandler = Arc<dyn Handler>;

/// Incoming request data handed to the dispatch engine.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Raw query string (text after `?`), if any
    pub query: Option<String>,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request from a method and a request target.
    ///
    /// Anything after the first `?` is kept as the raw query string.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    /// Add a header (builder style)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    ///
    /// Uses "last write wins" semantics for repeated keys. Values are
    /// returned as written; no percent-decoding is applied.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .as_deref()?
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .filter(|(k, _)| *k == name)
            .last()
            .map(|(_, v)| v)
    }
}

/// Response record written by handlers.
///
/// Status defaults to 200 until a handler sets one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Per-request state: request, match result, handler chain and cursor.
///
/// The chain is immutable once dispatch starts. `index` points at the
/// handler currently running and starts at -1, before the first one.
pub struct Context {
    request: Request,
    request_id: RequestId,
    params: PathParams,
    pattern: Option<Arc<str>>,
    handlers: Vec<BoxedHandler>,
    index: isize,
    aborted: bool,
    response: Response,
}

impl Context {
    /// Create a context for `request` with an empty chain.
    ///
    /// The request id is taken from the `x-request-id` header when it holds
    /// a valid ULID, otherwise a new one is generated.
    #[must_use]
    pub fn new(request: Request) -> Self {
        let request_id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        Self {
            request,
            request_id,
            params: PathParams::new(),
            pattern: None,
            handlers: Vec::new(),
            index: -1,
            aborted: false,
            response: Response::default(),
        }
    }

    /// Record the route match for this request.
    pub fn set_route(&mut self, pattern: Arc<str>, params: PathParams) {
        self.pattern = Some(pattern);
        self.params = params;
    }

    /// Install the handler chain and rewind the cursor.
    pub fn set_handlers(&mut self, handlers: Vec<BoxedHandler>) {
        self.handlers = handlers;
        self.index = -1;
        self.aborted = false;
    }

    /// Run the next handler in the chain.
    ///
    /// The handler at the new cursor position runs immediately. Whatever it
    /// does before calling `next()` itself happens before the rest of the
    /// chain; whatever it does afterwards happens after. A handler that
    /// returns without calling `next()` ends the chain there.
    pub fn next(&mut self) {
        if self.aborted {
            return;
        }
        self.index += 1;
        let handler = usize::try_from(self.index)
            .ok()
            .and_then(|index| self.handlers.get(index))
            .map(Arc::clone);
        if let Some(handler) = handler {
            handler.call(self);
        }
    }

    /// Skip every handler that has not started yet.
    ///
    /// Handlers already on the stack still finish their own code after
    /// `next()` returns.
    pub fn abort(&mut self) {
        self.aborted = true;
        self.index = isize::try_from(self.handlers.len()).unwrap_or(isize::MAX);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Position of the running handler in the chain (-1 before dispatch).
    #[must_use]
    pub fn index(&self) -> isize {
        self.index
    }

    /// Number of handlers in the chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.request.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.request.path
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Path parameter bound by the matched route.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Pattern of the matched route; `None` when a fallback handler runs.
    #[must_use]
    pub fn matched_pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query_param(name)
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.response.status
    }

    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Consume the context, keeping only the response record.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn status(&mut self, code: u16) {
        self.response.status = code;
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.response.set_header(name, value.to_string());
    }

    /// Plain-text response.
    pub fn string(&mut self, code: u16, body: impl Into<String>) {
        self.set_header("content-type", MIME_TEXT);
        self.status(code);
        self.response.body = body.into().into_bytes();
    }

    /// JSON response. Serialization failures turn into a 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: u16, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header("content-type", MIME_JSON);
                self.status(code);
                self.response.body = body;
            }
            Err(err) => self.server_error(&err.to_string()),
        }
    }

    pub fn html(&mut self, code: u16, body: impl Into<String>) {
        self.set_header("content-type", MIME_HTML);
        self.status(code);
        self.response.body = body.into().into_bytes();
    }

    /// 500 response carrying `message` as text.
    pub fn server_error(&mut self, message: &str) {
        self.string(500, message);
    }
}
