use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::dispatcher::Request;
use crate::engine::Engine;
use crate::manifest::{parse_method, RouteManifest};
use crate::middleware::MetricsMiddleware;
use crate::runtime_config::{GroupMatching, RuntimeConfig, GROUP_MATCHING_ENV};

/// Command-line interface for switchyard
///
/// Loads a YAML route manifest and inspects how requests would be routed
/// and which middleware would run.
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Switchyard route manifest tool", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Engine settings shared by every subcommand.
///
/// `--group-matching` falls back to `SWITCHYARD_GROUP_MATCHING`;
/// `--no-root-fallback` overrides `SWITCHYARD_ROOT_FALLBACK`.
#[derive(clap::Args, Debug, Clone)]
pub struct EngineArgs {
    /// Path to the route manifest (YAML)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// How group prefixes are tested: segments or prefix
    #[arg(long, env = GROUP_MATCHING_ENV)]
    pub group_matching: Option<GroupMatching>,

    /// Send an unrouted `/` to the not-found handler
    #[arg(long, default_value_t = false)]
    pub no_root_fallback: bool,
}

impl EngineArgs {
    fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::from_env();
        if let Some(mode) = self.group_matching {
            config.group_matching = mode;
        }
        if self.no_root_fallback {
            config.root_fallback = false;
        }
        config
    }

    fn build_engine(&self) -> Result<Engine> {
        let manifest = load_manifest(&self.manifest)?;
        manifest.build_engine(self.runtime_config())
    }

    /// Build the engine with a metrics handle; `None` when the manifest
    /// never installs metrics.
    fn build_engine_with_metrics(&self) -> Result<(Engine, Option<MetricsMiddleware>)> {
        let manifest = load_manifest(&self.manifest)?;
        let metrics = MetricsMiddleware::new();
        let engine = manifest.build_engine_with_metrics(self.runtime_config(), &metrics)?;
        Ok((engine, manifest.uses_metrics().then_some(metrics)))
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered routes, per method in registration order
    Routes {
        #[command(flatten)]
        engine: EngineArgs,

        /// Only list routes for this method
        #[arg(long)]
        method: Option<String>,
    },
    /// List route groups and their full prefixes
    Groups {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Dispatch one request through the engine and print the response,
    /// followed by the metrics counters when the manifest installs them
    Resolve {
        #[command(flatten)]
        engine: EngineArgs,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request target, e.g. `/v1/hello/abc?lang=en`
        target: String,

        /// Request header as `name:value`; may be repeated
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected 'name:value', got '{raw}'")),
    }
}

fn load_manifest(path: &Path) -> Result<RouteManifest> {
    RouteManifest::from_path(path)
}

/// Parse the process arguments and run the selected command on stdout.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or output fails.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}

/// Run a parsed command, writing its report to `out`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, a method is invalid,
/// or writing fails.
pub fn execute<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    match &cli.command {
        Commands::Routes { engine, method } => {
            let engine = engine.build_engine()?;
            let filter = method.as_deref().map(parse_method).transpose()?;
            for key in engine.router().routes() {
                if filter.as_ref().is_some_and(|m| *m != key.method) {
                    continue;
                }
                writeln!(out, "{:<7} {}", key.method.as_str(), key.pattern)?;
            }
            Ok(())
        }
        Commands::Groups { engine } => {
            let engine = engine.build_engine()?;
            for (id, prefix) in engine.groups() {
                let shown = if prefix.is_empty() { "(root)" } else { prefix };
                writeln!(out, "{:>3} {}", id.index(), shown)?;
            }
            Ok(())
        }
        Commands::Resolve {
            engine,
            method,
            target,
            headers,
        } => {
            let (engine, metrics) = engine.build_engine_with_metrics()?;
            let method = parse_method(method)?;

            let mut request = Request::new(method.clone(), target);
            for (name, value) in headers {
                request = request.with_header(name, value);
            }

            match engine.router().match_route(&method, &request.path) {
                Some(matched) => {
                    let params: Vec<String> = matched
                        .params
                        .iter()
                        .map(|(name, value)| format!("{name}={value}"))
                        .collect();
                    writeln!(out, "route: {} {} [{}]", method, matched.pattern, params.join(", "))?;
                }
                None => writeln!(out, "route: -")?,
            }

            let response = engine.handle(request);
            writeln!(out, "status: {}", response.status)?;
            for (name, value) in &response.headers {
                writeln!(out, "{name}: {value}")?;
            }
            writeln!(out)?;
            writeln!(out, "{}", response.body_text()).context("failed to write response body")?;
            if let Some(metrics) = metrics {
                writeln!(out)?;
                write!(out, "{}", metrics.render_prometheus())?;
            }
            Ok(())
        }
    }
}
