//! Backend origin addresses.
//!
//! An origin is a scheme plus an authority (`host[:port]`). Anything beyond
//! that (paths, queries, credentials) is rejected at parse time so that a
//! parsed `Origin` can always be combined with a request path directly.

use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use url::Url;

/// Error returned when an origin string cannot be used as a forwarding target.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("invalid origin '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme '{scheme}' in origin '{input}' (only http is proxied)")]
    UnsupportedScheme { input: String, scheme: String },

    #[error("origin '{0}' has no host")]
    MissingHost(String),

    #[error("origin '{0}' must not carry a path, query, fragment or credentials")]
    NotAnOrigin(String),
}

/// A backend server identified by scheme, host and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
}

impl Origin {
    /// Scheme used toward the origin.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// `host[:port]` of the origin.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl FromStr for Origin {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let url = Url::parse(input).map_err(|source| OriginError::Invalid {
            input: input.to_string(),
            source,
        })?;

        if url.scheme() != "http" {
            return Err(OriginError::UnsupportedScheme {
                input: input.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| OriginError::MissingHost(input.to_string()))?;

        if url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return Err(OriginError::NotAnOrigin(input.to_string()));
        }

        // `Url` drops the port when it equals the scheme default, which is
        // also what hyper's connector assumes when none is given.
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)
            .map_err(|_| OriginError::NotAnOrigin(input.to_string()))?;

        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
        })
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_and_port() {
        let origin: Origin = "http://localhost:8080".parse().unwrap();
        assert_eq!(origin.authority().as_str(), "localhost:8080");
        assert_eq!(origin.to_string(), "http://localhost:8080");
    }

    #[test]
    fn trailing_slash_is_accepted() {
        let origin: Origin = "http://127.0.0.1:3000/".parse().unwrap();
        assert_eq!(origin.to_string(), "http://127.0.0.1:3000");
    }

    #[test]
    fn default_port_is_left_implicit() {
        let origin: Origin = "http://example.com:80".parse().unwrap();
        assert_eq!(origin.authority().as_str(), "example.com");
    }

    #[test]
    fn ipv6_hosts_keep_brackets() {
        let origin: Origin = "http://[::1]:9000".parse().unwrap();
        assert_eq!(origin.authority().as_str(), "[::1]:9000");
    }

    #[test]
    fn rejects_https() {
        let err = "https://localhost:8443".parse::<Origin>().unwrap_err();
        assert!(matches!(err, OriginError::UnsupportedScheme { .. }));
    }

    #[test]
    fn rejects_paths_and_queries() {
        assert!(matches!(
            "http://localhost:3000/api".parse::<Origin>(),
            Err(OriginError::NotAnOrigin(_))
        ));
        assert!(matches!(
            "http://localhost:3000/?a=b".parse::<Origin>(),
            Err(OriginError::NotAnOrigin(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "localhost".parse::<Origin>(),
            Err(OriginError::Invalid { .. })
        ));
    }
}
