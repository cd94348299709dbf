use serde_json::{json, Map, Value};

use crate::dispatcher::Context;

/// Answers with a JSON description of how the request was routed.
///
/// Used for manifest routes that declare no fixed reply.
pub fn echo_handler(ctx: &mut Context) {
    let params: Map<String, Value> = ctx
        .params()
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    let body = json!({
        "pattern": ctx.matched_pattern(),
        "method": ctx.method().as_str(),
        "path": ctx.path(),
        "params": params,
        "request_id": ctx.request_id().to_string(),
    });
    ctx.json(200, &body);
}
