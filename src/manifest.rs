//! # Route Manifest
//!
//! Declarative route tables loaded from YAML, used by the `switchyard` CLI
//! to inspect routing and group behavior without writing handler code.
//!
//! ```yaml
//! middleware: [recovery, tracing]
//! routes:
//!   - { method: GET, path: /, reply: "index" }
//! groups:
//!   - prefix: /v1
//!     middleware: [metrics]
//!     routes:
//!       - { method: GET, path: /hello/:name }
//!       - { method: POST, path: /files/*path, status: 201 }
//!     groups:
//!       - prefix: /admin
//!         routes:
//!           - { method: DELETE, path: /users/:id }
//! ```
//!
//! Routes without a `reply` are served by the echo handler, which answers
//! with the matched pattern and the extracted parameters as JSON.
//!
//! Every `metrics` entry in one manifest feeds the same
//! [`MetricsMiddleware`]; pass your own to
//! [`RouteManifest::build_engine_with_metrics`] to read the counters.

use anyhow::{Context as _, Result};
use http::Method;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::dispatcher::{BoxedHandler, Context};
use crate::echo::echo_handler;
use crate::engine::Engine;
use crate::group::RouterGroup;
use crate::middleware::{MetricsMiddleware, RecoveryMiddleware, TracingMiddleware};
use crate::runtime_config::RuntimeConfig;

/// Built-in middleware that a manifest can reference by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareKind {
    Recovery,
    Tracing,
    Metrics,
}

impl MiddlewareKind {
    fn build(self, metrics: &MetricsMiddleware) -> BoxedHandler {
        match self {
            MiddlewareKind::Recovery => Arc::new(RecoveryMiddleware),
            MiddlewareKind::Tracing => Arc::new(TracingMiddleware),
            MiddlewareKind::Metrics => Arc::new(metrics.clone()),
        }
    }
}

/// One route declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    /// HTTP method, case-insensitive
    pub method: String,
    /// Pattern relative to the enclosing group's prefix
    pub path: String,
    /// Fixed text body; the echo handler is used when absent
    #[serde(default)]
    pub reply: Option<String>,
    /// Status for the fixed reply or the echo handler
    #[serde(default)]
    pub status: Option<u16>,
}

/// A group and everything nested in it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    pub prefix: String,
    #[serde(default)]
    pub middleware: Vec<MiddlewareKind>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

/// Top level of a manifest: the default group's contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteManifest {
    #[serde(default)]
    pub middleware: Vec<MiddlewareKind>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

impl RouteManifest {
    /// Parse a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or has unknown fields.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse route manifest")
    }

    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read route manifest {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid route manifest {}", path.display()))
    }

    /// Build an engine with every declared group, middleware and route.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending route if a method or pattern is
    /// invalid.
    pub fn build_engine(&self, config: RuntimeConfig) -> Result<Engine> {
        self.build_engine_with_metrics(config, &MetricsMiddleware::new())
    }

    /// Like [`build_engine`](Self::build_engine), installing clones of
    /// `metrics` wherever the manifest names `metrics`.
    ///
    /// # Errors
    ///
    /// Same as [`build_engine`](Self::build_engine).
    pub fn build_engine_with_metrics(
        &self,
        config: RuntimeConfig,
        metrics: &MetricsMiddleware,
    ) -> Result<Engine> {
        let mut engine = Engine::with_config(config);
        {
            let mut root = engine.root();
            for kind in &self.middleware {
                root.use_boxed(kind.build(metrics));
            }
            register_routes(&mut root, &self.routes)?;
            for group in &self.groups {
                register_group(&mut root, group, metrics)?;
            }
        }
        Ok(engine)
    }

    /// Whether any group, at any depth, installs `metrics`.
    #[must_use]
    pub fn uses_metrics(&self) -> bool {
        fn group_uses(spec: &GroupSpec) -> bool {
            spec.middleware.contains(&MiddlewareKind::Metrics) || spec.groups.iter().any(group_uses)
        }
        self.middleware.contains(&MiddlewareKind::Metrics) || self.groups.iter().any(group_uses)
    }
}

fn register_group(
    parent: &mut RouterGroup<'_>,
    spec: &GroupSpec,
    metrics: &MetricsMiddleware,
) -> Result<()> {
    let mut group = parent.group(&spec.prefix);
    for kind in &spec.middleware {
        group.use_boxed(kind.build(metrics));
    }
    register_routes(&mut group, &spec.routes)?;
    for child in &spec.groups {
        register_group(&mut group, child, metrics)?;
    }
    Ok(())
}

fn register_routes(group: &mut RouterGroup<'_>, routes: &[RouteSpec]) -> Result<()> {
    for route in routes {
        let method = parse_method(&route.method)?;
        group
            .add_route_boxed(method, &route.path, route_handler(route))
            .with_context(|| format!("cannot register {} {}", route.method, route.path))?;
    }
    Ok(())
}

/// Parse a method name, accepting any case.
///
/// # Errors
///
/// Returns an error for names that are not valid HTTP method tokens.
pub fn parse_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{name}'"))
}

fn route_handler(route: &RouteSpec) -> BoxedHandler {
    match (&route.reply, route.status) {
        (Some(reply), status) => {
            let reply = reply.clone();
            let status = status.unwrap_or(200);
            Arc::new(move |ctx: &mut Context| ctx.string(status, reply.as_str()))
        }
        (None, None) => Arc::new(echo_handler),
        (None, Some(status)) => Arc::new(move |ctx: &mut Context| {
            echo_handler(ctx);
            ctx.status(status);
        }),
    }
}
