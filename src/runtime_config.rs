//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the dispatch engine.
//!
//! ## Environment Variables
//!
//! ### `SWITCHYARD_GROUP_MATCHING`
//!
//! How a route group's prefix is tested against a request path when
//! collecting middleware:
//! - `segments` (default): the prefix must match whole path segments, so a
//!   `/v2` group applies to `/v2` and `/v2/x` but not to `/v2x`. `:name`
//!   segments in a prefix match any one segment.
//! - `prefix`: plain string-prefix test on the raw path (`/v2` also applies
//!   to `/v2x`).
//!
//! ### `SWITCHYARD_ROOT_FALLBACK`
//!
//! `true` (default) answers an unrouted `/` with `200 web service is
//! running.`; `false` sends it to the not-found handler like any other path.
//!
//! ## Usage
//!
//! ```rust
//! use switchyard::runtime_config::{GroupMatching, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_lookup(|key| match key {
//!     "SWITCHYARD_GROUP_MATCHING" => Some("prefix".to_string()),
//!     _ => None,
//! });
//! assert_eq!(config.group_matching, GroupMatching::Prefix);
//! assert!(config.root_fallback);
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const GROUP_MATCHING_ENV: &str = "SWITCHYARD_GROUP_MATCHING";
pub const ROOT_FALLBACK_ENV: &str = "SWITCHYARD_ROOT_FALLBACK";

/// Strategy for deciding whether a group's middleware applies to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMatching {
    /// Compare parsed segments
    #[default]
    Segments,
    /// Raw string-prefix test
    Prefix,
}

impl FromStr for GroupMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segments" | "segment" => Ok(GroupMatching::Segments),
            "prefix" | "string" => Ok(GroupMatching::Prefix),
            other => Err(format!("unknown group matching mode '{other}'")),
        }
    }
}

impl fmt::Display for GroupMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMatching::Segments => write!(f, "segments"),
            GroupMatching::Prefix => write!(f, "prefix"),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub group_matching: GroupMatching,
    /// Serve the "running" handler for an unrouted `/`
    pub root_fallback: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            group_matching: GroupMatching::Segments,
            root_fallback: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values keep the default and log a warning.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let group_matching = match lookup(GROUP_MATCHING_ENV) {
            Some(val) => val.parse().unwrap_or_else(|err| {
                warn!(variable = GROUP_MATCHING_ENV, error = %err, "using default");
                defaults.group_matching
            }),
            None => defaults.group_matching,
        };

        let root_fallback = match lookup(ROOT_FALLBACK_ENV) {
            Some(val) => parse_bool(&val).unwrap_or_else(|| {
                warn!(variable = ROOT_FALLBACK_ENV, value = %val, "not a boolean, using default");
                defaults.root_fallback
            }),
            None => defaults.root_fallback,
        };

        RuntimeConfig {
            group_matching,
            root_fallback,
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.group_matching, GroupMatching::Segments);
        assert!(config.root_fallback);
    }

    #[test]
    fn test_prefix_mode_and_fallback_off() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (GROUP_MATCHING_ENV, "Prefix"),
            (ROOT_FALLBACK_ENV, "off"),
        ]));
        assert_eq!(config.group_matching, GroupMatching::Prefix);
        assert!(!config.root_fallback);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (GROUP_MATCHING_ENV, "regex"),
            (ROOT_FALLBACK_ENV, "maybe"),
        ]));
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_group_matching_round_trips_through_display() {
        for mode in [GroupMatching::Segments, GroupMatching::Prefix] {
            assert_eq!(mode.to_string().parse::<GroupMatching>(), Ok(mode));
        }
    }
}
