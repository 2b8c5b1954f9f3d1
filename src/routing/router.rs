//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Resolve a request path to exactly one origin
//! - Compute the path to forward (preserved or prefix-stripped)
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Total: a table always carries a default origin, so there is no NoMatch

use crate::config::ProxyConfig;
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::origin::{Origin, OriginError};

/// Route label used for requests that fall through to the default origin.
pub const DEFAULT_ROUTE: &str = "default";

/// A single prefix → origin mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    name: String,
    matcher: PathPrefixMatcher,
    target: Origin,
    preserve_path: bool,
}

impl RouteRule {
    /// Create a rule that forwards matching paths unchanged.
    pub fn new(prefix: impl Into<String>, target: Origin) -> Self {
        let prefix = prefix.into();
        Self {
            name: prefix.clone(),
            matcher: PathPrefixMatcher::new(prefix),
            target,
            preserve_path: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Strip the matched prefix from forwarded paths.
    pub fn strip_prefix(mut self) -> Self {
        self.preserve_path = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn target(&self) -> &Origin {
        &self.target
    }

    pub fn preserve_path(&self) -> bool {
        self.preserve_path
    }

    fn forward_path(&self, path: &str) -> String {
        if self.preserve_path {
            path.to_string()
        } else {
            self.matcher.strip(path)
        }
    }
}

/// Ordered route rules plus the mandatory fallback origin.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    default_origin: Origin,
}

impl RouteTable {
    /// A table with no rules: everything goes to `default_origin`.
    pub fn new(default_origin: Origin) -> Self {
        Self {
            rules: Vec::new(),
            default_origin,
        }
    }

    /// Append a rule. Rules declared earlier take precedence.
    pub fn with_rule(mut self, rule: RouteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Compile the table from configuration, keeping declaration order.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, OriginError> {
        let mut table = Self::new(config.default_target.parse()?);
        for route in &config.routes {
            let mut rule = RouteRule::new(route.prefix.clone(), route.target.parse()?);
            if let Some(name) = &route.name {
                rule = rule.named(name.clone());
            }
            if !route.preserve_path {
                rule = rule.strip_prefix();
            }
            table = table.with_rule(rule);
        }
        Ok(table)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn default_origin(&self) -> &Origin {
        &self.default_origin
    }
}

/// Where one request goes and with which path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDecision {
    /// Origin the request is forwarded to.
    pub target: Origin,
    /// Path sent to the origin (query string not included).
    pub forward_path: String,
    /// Name of the matched rule, or [`DEFAULT_ROUTE`].
    pub route: String,
}

/// Resolves request paths against an immutable [`RouteTable`].
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// First rule, in declaration order, whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&RouteRule> {
        self.table.rules.iter().find(|rule| rule.matcher.matches(path))
    }

    /// Target origin for `path`. Never fails.
    pub fn resolve(&self, path: &str) -> &Origin {
        self.match_path(path)
            .map(RouteRule::target)
            .unwrap_or(&self.table.default_origin)
    }

    /// Full forwarding decision for `path`.
    pub fn decide(&self, path: &str) -> ProxyDecision {
        match self.match_path(path) {
            Some(rule) => ProxyDecision {
                target: rule.target.clone(),
                forward_path: rule.forward_path(path),
                route: rule.name.clone(),
            },
            None => ProxyDecision {
                target: self.table.default_origin.clone(),
                forward_path: path.to_string(),
                route: DEFAULT_ROUTE.to_string(),
            },
        }
    }
}
