use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::dispatcher::{Context, Handler};

#[derive(Debug, Default)]
struct Counters {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
}

/// Middleware for collecting Prometheus-compatible request metrics
///
/// Tracks request counts, latency, and 4xx/5xx responses. Clones share the
/// same counters, so keep one clone to read them after installing another.
/// All counters use relaxed atomics; readings are eventually consistent.
///
/// A panic escaping the rest of the chain is recorded as a 5xx with its
/// latency, then resumed so an outer [`RecoveryMiddleware`] can answer it.
///
/// [`RecoveryMiddleware`]: super::RecoveryMiddleware
#[derive(Debug, Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.counters.request_count.load(Ordering::Relaxed)
    }

    /// Mean time spent in the rest of the chain.
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count() as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.counters.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses with a 4xx status
    #[must_use]
    pub fn client_errors(&self) -> usize {
        self.counters.client_errors.load(Ordering::Relaxed)
    }

    /// Responses with a 5xx status
    #[must_use]
    pub fn server_errors(&self) -> usize {
        self.counters.server_errors.load(Ordering::Relaxed)
    }

    /// Render the counters in Prometheus text exposition format.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        format!(
            "# HELP switchyard_requests_total Total number of handled requests\n\
             # TYPE switchyard_requests_total counter\n\
             switchyard_requests_total {}\n\
             # HELP switchyard_request_latency_seconds Average request latency in seconds\n\
             # TYPE switchyard_request_latency_seconds gauge\n\
             switchyard_request_latency_seconds {}\n\
             # HELP switchyard_responses_total Responses by status class\n\
             # TYPE switchyard_responses_total counter\n\
             switchyard_responses_total{{class=\"4xx\"}} {}\n\
             switchyard_responses_total{{class=\"5xx\"}} {}\n",
            self.request_count(),
            self.average_latency().as_secs_f64(),
            self.client_errors(),
            self.server_errors()
        )
    }
}

impl Handler for MetricsMiddleware {
    fn call(&self, ctx: &mut Context) {
        self.counters.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));

        let latency_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.counters
            .total_latency_ns
            .fetch_add(latency_ns, Ordering::Relaxed);
        let status = if outcome.is_err() { 500 } else { ctx.status_code() };
        match status {
            400..=499 => {
                self.counters.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.counters.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        if let Err(panic) = outcome {
            resume_unwind(panic);
        }
    }
}
