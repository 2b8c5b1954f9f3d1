//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every target is a usable origin
//! - Validate value ranges (timeouts > 0)
//! - Reject log levels the filter would silently ignore
//! - Detect duplicated routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Overlapping prefixes are legal; only exact duplicates are rejected

use std::net::SocketAddr;

use tracing::level_filters::LevelFilter;

use crate::config::schema::ProxyConfig;
use crate::routing::origin::{Origin, OriginError};

/// A single semantic problem in a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("default_target: {0}")]
    DefaultTarget(#[source] OriginError),

    #[error("routes[{index}]: prefix must be non-empty and start with '/', got '{prefix}'")]
    BadPrefix { index: usize, prefix: String },

    #[error("routes[{index}]: {source}")]
    RouteTarget {
        index: usize,
        #[source]
        source: OriginError,
    },

    #[error("routes[{index}] duplicates routes[{first}]")]
    DuplicateRoute { index: usize, first: usize },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "observability.log_level '{0}' is not one of off, error, warn, info, debug, trace"
    )]
    LogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.default_target.parse::<Origin>() {
        errors.push(ValidationError::DefaultTarget(e));
    }

    for (index, route) in config.routes.iter().enumerate() {
        if route.prefix.is_empty() || !route.prefix.starts_with('/') {
            errors.push(ValidationError::BadPrefix {
                index,
                prefix: route.prefix.clone(),
            });
        }

        if let Err(source) = route.target.parse::<Origin>() {
            errors.push(ValidationError::RouteTarget { index, source });
        }

        // Name is a label only; two rules differing just by name are the same rule.
        if let Some(first) = config.routes[..index].iter().position(|other| {
            other.prefix == route.prefix
                && other.target == route.target
                && other.preserve_path == route.preserve_path
        }) {
            errors.push(ValidationError::DuplicateRoute { index, first });
        }
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("response_secs", timeouts.response_secs),
        ("idle_secs", timeouts.idle_secs),
        ("pool_idle_secs", timeouts.pool_idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let observability = &config.observability;
    if observability.log_level.trim().parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }

    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
