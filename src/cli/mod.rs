//! # CLI Module
//!
//! Command-line access to the dispatch engine, driven by a YAML route
//! manifest (see [`crate::manifest`]).
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List every registered method and pattern, grouped by method and in
//! registration order within a method (the order sibling segments are tried
//! in):
//!
//! ```bash
//! switchyard routes --manifest routes.yaml
//! switchyard routes --manifest routes.yaml --method post
//! ```
//!
//! ### `groups`
//!
//! List groups with their full prefixes in creation order:
//!
//! ```bash
//! switchyard groups --manifest routes.yaml
//! ```
//!
//! ### `resolve`
//!
//! Dispatch one request through the engine and print the matched route,
//! the status, the headers and the body:
//!
//! ```bash
//! switchyard resolve --manifest routes.yaml -X GET /v1/hello/abc -H x-request-id:01ARZ3NDEKTSV4RRFFQ69G5FAV
//! ```
//!
//! Every command accepts `--group-matching segments|prefix` and
//! `--no-root-fallback` to override the environment configuration.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, run_cli, Cli, Commands, EngineArgs};
