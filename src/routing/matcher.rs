//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against a literal prefix
//! - Strip the matched prefix when a rule asks for it
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Plain `starts_with`, no segment awareness: `/frontend` also matches
//!   `/frontend-old/x`. Declare the more specific prefix first if that matters.
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Remove the prefix from a matching path.
    ///
    /// The result is always an absolute path: an empty remainder becomes `/`
    /// and a remainder without a leading slash gets one.
    pub fn strip(&self, path: &str) -> String {
        let rest = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);
        if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{rest}")
        }
    }
}
