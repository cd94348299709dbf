//! # Middleware Module
//!
//! Built-in middleware for the request chain.
//!
//! A middleware is any [`Handler`](crate::dispatcher::Handler) that calls
//! [`Context::next`](crate::dispatcher::Context::next) to run the rest of the
//! chain. Work done before the call happens on the way in, work done after it
//! sees the final response.
//!
//! - [`RecoveryMiddleware`] - turns handler panics into `500` responses
//! - [`TracingMiddleware`] - request span plus a completion event with status and latency
//! - [`MetricsMiddleware`] - request count, latency and error counters
//!
//! ```rust
//! use switchyard::middleware::{MetricsMiddleware, RecoveryMiddleware, TracingMiddleware};
//! use switchyard::{Context, Engine, Request};
//!
//! let metrics = MetricsMiddleware::new();
//! let mut engine = Engine::new();
//! engine
//!     .use_middleware(RecoveryMiddleware)
//!     .use_middleware(TracingMiddleware)
//!     .use_middleware(metrics.clone());
//! engine.get("/ping", |ctx: &mut Context| ctx.string(200, "pong")).unwrap();
//!
//! let _ = engine.handle(Request::get("/ping"));
//! assert_eq!(metrics.request_count(), 1);
//! ```

mod metrics;
mod recovery;
mod tracing;

pub use self::metrics::MetricsMiddleware;
pub use self::recovery::{RecoveryMiddleware, INTERNAL_SERVER_ERROR};
pub use self::tracing::TracingMiddleware;
