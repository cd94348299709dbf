use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::dispatcher::{Context, Handler};

/// Wraps the rest of the chain in a `request` span and logs the outcome.
///
/// The completion event carries the final status, so it reflects whatever
/// the terminal handler (or a short-circuiting middleware) wrote. A panic in
/// the rest of the chain is logged as a failed request with status 500 and
/// then resumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Handler for TracingMiddleware {
    fn call(&self, ctx: &mut Context) {
        let span = info_span!(
            "request",
            method = %ctx.method(),
            path = %ctx.path(),
            request_id = %ctx.request_id()
        );
        let _guard = span.enter();
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let route = ctx.matched_pattern().unwrap_or("-");
        match outcome {
            Err(panic) => {
                warn!(status = 500_u16, route, latency_ms, panicked = true, "request failed");
                resume_unwind(panic);
            }
            Ok(()) => {
                let status = ctx.status_code();
                if status >= 500 {
                    warn!(status, route, latency_ms, "request failed");
                } else {
                    info!(status, route, latency_ms, "request completed");
                }
            }
        }
    }
}
