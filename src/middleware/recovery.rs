use std::any::Any;
use std::cell::Cell;
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::sync::Once;
use tracing::error;

use crate::dispatcher::{Context, Handler};

/// Body sent when a handler panics.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Converts a panic anywhere later in the chain into a 500 response.
///
/// Install it first so it wraps every other middleware and the route
/// handler. The panic message and a backtrace are logged at error level;
/// handlers that had not started when the panic happened are skipped.
///
/// The process panic hook still runs first, so by default the payload also
/// appears on stderr next to the structured event. Call
/// [`RecoveryMiddleware::install_quiet_panic_hook`] once at startup to keep
/// recovered panics out of stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryMiddleware;

thread_local! {
    static RECOVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

impl RecoveryMiddleware {
    /// Wrap the current panic hook so it stays silent for panics raised
    /// under a `RecoveryMiddleware` on the same thread.
    ///
    /// Other panics still reach the previous hook. Installing more than once
    /// is a no-op.
    pub fn install_quiet_panic_hook() {
        QUIET_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if !is_recovering() {
                    previous(info);
                }
            }));
        });
    }
}

fn is_recovering() -> bool {
    RECOVERY_DEPTH.with(|depth| depth.get() > 0)
}

impl Handler for RecoveryMiddleware {
    fn call(&self, ctx: &mut Context) {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() - 1));
        if let Err(panic) = outcome {
            let panic_message = panic_message(panic.as_ref());
            let backtrace = std::backtrace::Backtrace::force_capture();

            error!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                panic_message = %panic_message,
                backtrace = %backtrace,
                "Handler panicked"
            );

            ctx.abort();
            ctx.server_error(INTERNAL_SERVER_ERROR);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{BoxedHandler, Request};
    use std::sync::Arc;

    #[test]
    fn test_recovery_scope_tracks_nesting() {
        let seen: Arc<std::sync::Mutex<Vec<bool>>> = Arc::default();
        let inner = Arc::clone(&seen);
        let chain: Vec<BoxedHandler> = vec![
            Arc::new(RecoveryMiddleware),
            Arc::new(RecoveryMiddleware),
            Arc::new(move |_ctx: &mut Context| inner.lock().unwrap().push(is_recovering())),
        ];

        assert!(!is_recovering());
        let mut ctx = Context::new(Request::get("/"));
        ctx.set_handlers(chain);
        ctx.next();
        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert!(!is_recovering());
    }

    #[test]
    fn test_quiet_hook_still_recovers() {
        RecoveryMiddleware::install_quiet_panic_hook();
        RecoveryMiddleware::install_quiet_panic_hook();

        let chain: Vec<BoxedHandler> = vec![
            Arc::new(RecoveryMiddleware),
            Arc::new(|_ctx: &mut Context| {
                panic::panic_any("quiet failure");
            }),
        ];
        let mut ctx = Context::new(Request::get("/quiet"));
        ctx.set_handlers(chain);
        ctx.next();
        assert_eq!(ctx.status_code(), 500);
        assert_eq!(ctx.response().body_text(), INTERNAL_SERVER_ERROR);
        assert!(!is_recovering());
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
