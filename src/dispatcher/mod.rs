//! # Dispatcher Module
//!
//! Request context and handler-chain execution.
//!
//! Every request gets a fresh [`Context`] holding an ordered chain of
//! [`Handler`]s: the middleware of every route group that applies, then one
//! terminal handler. [`Context::next`] advances a cursor through that chain.
//! Middleware wrap the remainder of the chain by calling `next()` in the
//! middle of their own work, or stop it by not calling `next()` at all:
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::dispatcher::{BoxedHandler, Context, Request};
//!
//! let guard: BoxedHandler = Arc::new(|ctx: &mut Context| {
//!     if ctx.header("authorization").is_none() {
//!         ctx.string(401, "unauthorized");
//!         return;
//!     }
//!     ctx.next();
//! });
//! let handler: BoxedHandler = Arc::new(|ctx: &mut Context| ctx.string(200, "secret"));
//!
//! let mut ctx = Context::new(Request::get("/secret"));
//! ctx.set_handlers(vec![guard, handler]);
//! ctx.next();
//! assert_eq!(ctx.status_code(), 401);
//! ```

mod core;

pub use core::{
    BoxedHandler, Context, Handler, HeaderVec, Request, Response, MAX_INLINE_HEADERS, MIME_HTML,
    MIME_JSON, MIME_TEXT,
};
