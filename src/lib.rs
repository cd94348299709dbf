//! # Switchyard
//!
//! **Switchyard** is an HTTP request routing and dispatch core. It matches
//! `(method, path)` pairs against registered patterns, extracts path
//! parameters, and runs each request through an ordered chain of middleware
//! ending in exactly one terminal handler.
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern parsing, per-method segment tries, parameter extraction
//! - **[`dispatcher`]** - [`Handler`], [`Request`], [`Response`] and the per-request [`Context`]
//! - **[`group`]** - prefix-scoped route groups carrying their own middleware
//! - **[`engine`]** - the [`Engine`] tying router and groups together
//! - **[`middleware`]** - recovery, tracing and metrics middleware
//! - **[`runtime_config`]** - environment-driven engine settings
//! - **[`manifest`]** - YAML route manifests for the `switchyard` CLI
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ## Request flow
//!
//! 1. Middleware of every group whose prefix covers the path are collected
//!    in group-creation order.
//! 2. The route is matched; its handler is appended. An unrouted `/` gets the
//!    "running" handler, anything else the not-found handler.
//! 3. [`Context::next`] walks the chain. Each middleware decides whether and
//!    when the rest of the chain runs.
//!
//! ## Example
//!
//! ```rust
//! use switchyard::{Context, Engine, Request};
//!
//! let mut engine = Engine::new();
//! engine
//!     .get("/hello/:name", |ctx: &mut Context| {
//!         let name = ctx.param("name").unwrap_or_default().to_string();
//!         ctx.string(200, format!("hello {name}"));
//!     })
//!     .unwrap();
//! engine
//!     .get("/assets/*filepath", |ctx: &mut Context| {
//!         let file = ctx.param("filepath").unwrap_or_default().to_string();
//!         ctx.string(200, file);
//!     })
//!     .unwrap();
//!
//! assert_eq!(engine.handle(Request::get("/hello/abc")).body_text(), "hello abc");
//! assert_eq!(engine.handle(Request::get("/assets/css/site.css")).body_text(), "css/site.css");
//! assert_eq!(engine.handle(Request::get("/")).body_text(), "web service is running.");
//! assert_eq!(engine.handle(Request::get("/missing")).status, 404);
//! ```

pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod engine;
pub mod group;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod middleware;
pub mod router;
pub mod runtime_config;

pub use dispatcher::{BoxedHandler, Context, Handler, Request, Response};
pub use engine::Engine;
pub use group::{GroupId, RouterGroup};
pub use ids::RequestId;
pub use router::{PathParams, RouteError, RouteMatch, Router};
pub use runtime_config::{GroupMatching, RuntimeConfig};
