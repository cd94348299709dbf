//! Path segmentation and route pattern validation.
//!
//! Both registration patterns and request paths go through [`parse_pattern`],
//! so `/a`, `/a/` and `//a` all describe the same route.

use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

/// Sentinel segment that stands for the root of every path.
pub const ROOT_SEGMENT: &str = "/";

/// Segments kept inline before spilling to the heap.
/// Request paths deeper than this are rare.
pub const MAX_INLINE_SEGMENTS: usize = 8;

/// Parsed path: the root sentinel followed by the non-empty segments.
pub type Segments<'a> = SmallVec<[&'a str; MAX_INLINE_SEGMENTS]>;

/// Split a path (or pattern) on `/`.
///
/// The first token is always replaced by [`ROOT_SEGMENT`], whatever text
/// precedes the first slash. Empty tokens after it are dropped, which
/// collapses repeated and trailing slashes. `:name` and `*name` markers are
/// kept verbatim.
///
/// ```
/// use switchyard::router::parse_pattern;
///
/// assert_eq!(parse_pattern("/p/:name").as_slice(), &["/", "p", ":name"]);
/// assert_eq!(parse_pattern("//a///b/").as_slice(), &["/", "a", "b"]);
/// assert_eq!(parse_pattern("").as_slice(), &["/"]);
/// ```
#[must_use]
pub fn parse_pattern(pattern: &str) -> Segments<'_> {
    let mut parts = Segments::new();
    for (position, item) in pattern.split('/').enumerate() {
        if position == 0 {
            parts.push(ROOT_SEGMENT);
        } else if !item.is_empty() {
            parts.push(item);
        }
    }
    parts
}

/// True for `:name` parameters and `*name` wildcards.
#[inline]
#[must_use]
pub fn is_wild(part: &str) -> bool {
    part.starts_with(':') || part.starts_with('*')
}

/// Reasons a route pattern is refused at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern does not begin with `/`
    MissingLeadingSlash,
    /// A `*` segment is followed by further segments
    WildcardNotLast {
        /// The offending wildcard segment
        segment: String,
    },
    /// A `:` segment without a name
    EmptyParamName,
    /// The same parameter name is bound twice
    DuplicateParam {
        /// The repeated name
        name: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingLeadingSlash => write!(f, "pattern must start with '/'"),
            PatternError::WildcardNotLast { segment } => {
                write!(f, "wildcard segment '{segment}' must be the final segment")
            }
            PatternError::EmptyParamName => write!(f, "parameter segment ':' has no name"),
            PatternError::DuplicateParam { name } => {
                write!(f, "parameter '{name}' appears more than once")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Check that a registration pattern is well formed.
///
/// A bare `*` is an anonymous wildcard: it matches the tail but binds no
/// parameter.
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    if !pattern.starts_with('/') {
        return Err(PatternError::MissingLeadingSlash);
    }

    let parts = parse_pattern(pattern);
    let mut seen: HashSet<&str> = HashSet::with_capacity(parts.len());
    let last = parts.len() - 1;

    for (position, part) in parts.iter().enumerate().skip(1) {
        let name = if let Some(name) = part.strip_prefix(':') {
            if name.is_empty() {
                return Err(PatternError::EmptyParamName);
            }
            name
        } else if let Some(name) = part.strip_prefix('*') {
            if position != last {
                return Err(PatternError::WildcardNotLast {
                    segment: (*part).to_string(),
                });
            }
            name
        } else {
            continue;
        };

        if !name.is_empty() && !seen.insert(name) {
            return Err(PatternError::DuplicateParam {
                name: name.to_string(),
            });
        }
    }

    Ok(())
}
