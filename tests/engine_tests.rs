use std::sync::{Arc, Mutex};
use std::thread;

use http::Method;
use switchyard::engine::{NOT_FOUND_MESSAGE, RUNNING_MESSAGE};
use switchyard::router::PatternError;
use switchyard::{
    Context, Engine, GroupId, GroupMatching, Request, RequestId, RouteError, RuntimeConfig,
};

type Log = Arc<Mutex<Vec<String>>>;

fn tagging(log: &Log, tag: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |ctx: &mut Context| {
        log.lock().unwrap().push(tag.to_string());
        ctx.next();
    }
}

fn tags(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn reply(text: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    move |ctx: &mut Context| ctx.string(200, text)
}

#[test]
fn test_unrouted_root_reports_running() {
    let engine = Engine::new();
    let res = engine.handle(Request::get("/"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), RUNNING_MESSAGE);
    assert_eq!(res.header("content-type"), Some("text/plain;charset=utf-8"));

    // any method reaches the fallback
    let res = engine.handle(Request::post("/"));
    assert_eq!(res.status, 200);
}

#[test]
fn test_registered_root_beats_fallback() {
    let mut engine = Engine::new();
    engine.get("/", reply("home")).unwrap();
    assert_eq!(engine.handle(Request::get("/")).body_text(), "home");
    // another method on `/` still falls back
    assert_eq!(
        engine.handle(Request::new(Method::PUT, "/")).body_text(),
        RUNNING_MESSAGE
    );
}

#[test]
fn test_root_fallback_can_be_disabled() {
    let engine = Engine::with_config(RuntimeConfig {
        root_fallback: false,
        ..RuntimeConfig::default()
    });
    let res = engine.handle(Request::get("/"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body_text(), NOT_FOUND_MESSAGE);
}

#[test]
fn test_unmatched_path_is_404() {
    let mut engine = Engine::new();
    engine.get("/hello/:name", reply("hi")).unwrap();

    let res = engine.handle(Request::get("/bye"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body_text(), NOT_FOUND_MESSAGE);

    // wrong method is not distinguished from a missing path
    let res = engine.handle(Request::post("/hello/abc"));
    assert_eq!(res.status, 404);
}

#[test]
fn test_custom_no_route_handler() {
    let mut engine = Engine::new();
    engine.no_route(|ctx: &mut Context| {
        let path = ctx.path().to_string();
        ctx.json(404, &serde_json::json!({ "error": "not found", "path": path }));
    });

    let res = engine.handle(Request::get("/missing"));
    assert_eq!(res.status, 404);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["path"], "/missing");
    assert_eq!(
        res.header("content-type"),
        Some("application/json;charset=utf-8")
    );
}

#[test]
fn test_params_reach_the_handler() {
    let mut engine = Engine::new();
    engine
        .get("/hello/:name", |ctx: &mut Context| {
            let body = format!(
                "{} via {}",
                ctx.param("name").unwrap_or("?"),
                ctx.matched_pattern().unwrap_or("-")
            );
            ctx.string(200, body);
        })
        .unwrap();
    engine
        .get("/assets/*filepath", |ctx: &mut Context| {
            let body = ctx.param("filepath").unwrap_or("?").to_string();
            ctx.string(200, body);
        })
        .unwrap();

    assert_eq!(
        engine.handle(Request::get("/hello/abc")).body_text(),
        "abc via /hello/:name"
    );
    assert_eq!(
        engine.handle(Request::get("/assets/css/site.css")).body_text(),
        "css/site.css"
    );
}

#[test]
fn test_query_and_headers_are_visible() {
    let mut engine = Engine::new();
    engine
        .get("/search", |ctx: &mut Context| {
            let body = format!(
                "{}|{}|{}",
                ctx.query("q").unwrap_or("-"),
                ctx.query("missing").unwrap_or("-"),
                ctx.header("X-Client").unwrap_or("-")
            );
            ctx.string(200, body);
        })
        .unwrap();

    let req = Request::get("/search?q=first&page=2&q=rust").with_header("x-client", "cli");
    assert_eq!(engine.handle(req).body_text(), "rust|-|cli");
}

#[test]
fn test_request_id_taken_from_header() {
    let id: RequestId = "01ARZ3NDEKTSV4RRFFQ69G5FAV".parse().unwrap();
    let seen = Arc::new(Mutex::new(None));
    let mut engine = Engine::new();
    let sink = Arc::clone(&seen);
    engine
        .get("/id", move |ctx: &mut Context| {
            *sink.lock().unwrap() = Some(ctx.request_id());
        })
        .unwrap();

    let _ = engine.handle(Request::get("/id").with_header("x-request-id", &id.to_string()));
    assert_eq!(*seen.lock().unwrap(), Some(id));

    let _ = engine.handle(Request::get("/id").with_header("x-request-id", "not-a-ulid"));
    assert_ne!(*seen.lock().unwrap(), Some(id));
}

#[test]
fn test_groups_only_run_their_own_middleware() {
    let log: Log = Log::default();
    let mut engine = Engine::new();
    engine.use_middleware(tagging(&log, "global"));
    {
        let mut v1 = engine.group("/v1");
        v1.use_middleware(tagging(&log, "v1"));
        v1.get("/hello", reply("v1 hello")).unwrap();
    }
    {
        let mut v2 = engine.group("/v2");
        v2.use_middleware(tagging(&log, "v2"));
        v2.get("/hello", reply("v2 hello")).unwrap();
    }

    let res = engine.handle(Request::get("/v1/hello"));
    assert_eq!(res.body_text(), "v1 hello");
    assert_eq!(tags(&log), vec!["global", "v1"]);

    log.lock().unwrap().clear();
    let res = engine.handle(Request::get("/v2/hello"));
    assert_eq!(res.body_text(), "v2 hello");
    assert_eq!(tags(&log), vec!["global", "v2"]);
}

#[test]
fn test_nested_groups_concatenate_prefixes() {
    let log: Log = Log::default();
    let mut engine = Engine::new();
    let admin_id;
    {
        let mut api = engine.group("/api");
        api.use_middleware(tagging(&log, "api"));
        let api_id = api.id();
        let mut admin = api.group("/admin");
        admin.use_middleware(tagging(&log, "admin"));
        admin.delete("/users/:id", reply("deleted")).unwrap();
        assert_eq!(admin.prefix(), "/api/admin");
        assert_eq!(admin.parent(), Some(api_id));
        admin_id = admin.id();
    }

    let res = engine.handle(Request::new(Method::DELETE, "/api/admin/users/9"));
    assert_eq!(res.body_text(), "deleted");
    assert_eq!(tags(&log), vec!["api", "admin"]);

    let prefixes: Vec<&str> = engine.groups().map(|(_, prefix)| prefix).collect();
    assert_eq!(prefixes, vec!["", "/api", "/api/admin"]);
    assert_eq!(admin_id.index(), 2);
}

#[test]
fn test_group_middleware_applies_to_unmatched_paths_under_prefix() {
    let log: Log = Log::default();
    let mut engine = Engine::new();
    engine.group("/v1").use_middleware(tagging(&log, "v1"));

    let res = engine.handle(Request::get("/v1/unknown"));
    assert_eq!(res.status, 404);
    assert_eq!(tags(&log), vec!["v1"]);
}

#[test]
fn test_middleware_order_follows_group_creation() {
    let log: Log = Log::default();
    let mut engine = Engine::new();
    let inner = engine.group("/a/b").id();
    let outer = engine.group("/a").id();
    engine
        .group_mut(inner)
        .unwrap()
        .use_middleware(tagging(&log, "a/b"));
    engine
        .group_mut(outer)
        .unwrap()
        .use_middleware(tagging(&log, "a"));
    engine.use_middleware(tagging(&log, "root"));

    let _ = engine.handle(Request::get("/a/b/c"));
    assert_eq!(tags(&log), vec!["root", "a/b", "a"]);
    assert_eq!(engine.groups().count(), 3);
    assert!(engine.group_mut(GroupId::ROOT).is_some());
}

#[test]
fn test_segment_matching_respects_boundaries() {
    let log: Log = Log::default();
    let mut engine = Engine::new();
    engine.group("/v2").use_middleware(tagging(&log, "v2"));
    engine.get("/v2x", reply("v2x")).unwrap();

    let res = engine.handle(Request::get("/v2x"));
    assert_eq!(res.body_text(), "v2x");
    assert!(tags(&log).is_empty());
}

#[test]
fn test_prefix_matching_uses_raw_string_prefix() {
    let log: Log = Log::default();
    let mut engine = Engine::with_config(RuntimeConfig {
        group_matching: GroupMatching::Prefix,
        ..RuntimeConfig::default()
    });
    engine.group("/v2").use_middleware(tagging(&log, "v2"));
    engine.get("/v2x", reply("v2x")).unwrap();

    let _ = engine.handle(Request::get("/v2x"));
    assert_eq!(tags(&log), vec!["v2"]);
    assert_eq!(engine.config().group_matching, GroupMatching::Prefix);
}

#[test]
fn test_parametric_group_prefix() {
    let log: Log = Log::default();
    let mut engine = Engine::new();
    {
        let mut user = engine.group("/users/:id");
        user.use_middleware(tagging(&log, "user"));
        user.get("/posts", |ctx: &mut Context| {
            let id = ctx.param("id").unwrap_or("?").to_string();
            ctx.string(200, id);
        })
        .unwrap();
    }

    let res = engine.handle(Request::get("/users/7/posts"));
    assert_eq!(res.body_text(), "7");
    assert_eq!(tags(&log), vec!["user"]);
}

#[test]
fn test_group_rejects_malformed_pattern() {
    let mut engine = Engine::new();
    let err = engine
        .group("/files")
        .get("/*rest/meta", reply("never"))
        .map(|_| ())
        .unwrap_err();
    match err {
        RouteError::InvalidPattern {
            pattern, reason, ..
        } => {
            assert_eq!(pattern, "/files/*rest/meta");
            assert_eq!(
                reason,
                PatternError::WildcardNotLast {
                    segment: "*rest".to_string()
                }
            );
        }
    }
    assert!(engine.router().is_empty());
}

#[test]
fn test_method_shortcuts_register_each_method() {
    let mut engine = Engine::new();
    engine
        .get("/r", reply("get"))
        .and_then(|e| e.post("/r", reply("post")))
        .and_then(|e| e.put("/r", reply("put")))
        .and_then(|e| e.delete("/r", reply("delete")))
        .and_then(|e| e.patch("/r", reply("patch")))
        .and_then(|e| e.head("/r", reply("head")))
        .and_then(|e| e.options("/r", reply("options")))
        .unwrap();

    assert_eq!(engine.router().len(), 7);
    for (method, body) in [
        (Method::GET, "get"),
        (Method::POST, "post"),
        (Method::PUT, "put"),
        (Method::DELETE, "delete"),
        (Method::PATCH, "patch"),
        (Method::HEAD, "head"),
        (Method::OPTIONS, "options"),
    ] {
        assert_eq!(engine.handle(Request::new(method, "/r")).body_text(), body);
    }
}

#[test]
fn test_concurrent_dispatch_on_shared_engine() {
    let mut engine = Engine::with_default_middleware();
    engine
        .get("/echo/:n", |ctx: &mut Context| {
            let n = ctx.param("n").unwrap_or_default().to_string();
            ctx.string(200, n);
        })
        .unwrap();
    let engine = Arc::new(engine);

    thread::scope(|scope| {
        for worker in 0..8 {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                for i in 0..50 {
                    let n = format!("{worker}-{i}");
                    let res = engine.handle(Request::get(&format!("/echo/{n}")));
                    assert_eq!(res.status, 200);
                    assert_eq!(res.body_text(), n);
                }
            });
        }
    });
}
