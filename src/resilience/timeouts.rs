//! Timeout enforcement.
//!
//! # Responsibilities
//! - Carry the connect, response-head and idle deadlines for upstream calls
//! - Bound how long a streamed upstream body may stay silent
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - No overall body deadline: long downloads are fine as long as bytes keep flowing

use std::time::Duration;

use futures_util::{stream, Stream, StreamExt};

use crate::config::TimeoutConfig;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Deadlines applied to every upstream exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub connect: Duration,
    pub response: Duration,
    pub idle: Duration,
    pub pool_idle: Duration,
    /// Drain window for open client connections once shutdown starts.
    pub shutdown: Duration,
}

impl From<&TimeoutConfig> for Deadlines {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            response: Duration::from_secs(config.response_secs),
            idle: Duration::from_secs(config.idle_secs),
            pool_idle: Duration::from_secs(config.pool_idle_secs),
            shutdown: Duration::from_secs(config.shutdown_secs),
        }
    }
}

impl Default for Deadlines {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

/// The upstream body produced no data within the idle deadline.
#[derive(Debug, thiserror::Error)]
#[error("upstream body idle for {0:?}")]
pub struct IdleTimeout(pub Duration);

/// Wrap a chunk stream so that it fails if no item arrives within `idle`.
///
/// The stream ends after the first error, whether it came from the inner
/// stream or from the timer.
pub fn with_idle_timeout<S, T, E>(
    inner: S,
    idle: Duration,
) -> impl Stream<Item = Result<T, BoxError>> + Send + 'static
where
    S: Stream<Item = Result<T, E>> + Send + Unpin + 'static,
    T: Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    stream::unfold(Some(inner), move |state| async move {
        let mut inner = state?;
        match tokio::time::timeout(idle, inner.next()).await {
            Ok(Some(Ok(item))) => Some((Ok(item), Some(inner))),
            Ok(Some(Err(e))) => Some((Err(e.into()), None)),
            Ok(None) => None,
            Err(_) => Some((Err(IdleTimeout(idle).into()), None)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadlines_from_config() {
        let deadlines = Deadlines::default();
        assert_eq!(deadlines.connect, Duration::from_secs(5));
        assert_eq!(deadlines.response, Duration::from_secs(60));
        assert_eq!(deadlines.idle, Duration::from_secs(60));
        assert_eq!(deadlines.pool_idle, Duration::from_secs(90));
        assert_eq!(deadlines.shutdown, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn passes_items_through_in_order() {
        let inner = stream::iter(vec![Ok::<_, std::io::Error>(1), Ok(2), Ok(3)]);
        let items: Vec<_> = with_idle_timeout(inner, Duration::from_secs(1))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn silent_stream_times_out_once() {
        let inner = stream::pending::<Result<u8, std::io::Error>>();
        let items: Vec<_> = with_idle_timeout(inner, Duration::from_millis(50))
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        let err = items.into_iter().next().unwrap().unwrap_err();
        assert!(err.downcast_ref::<IdleTimeout>().is_some());
    }

    #[tokio::test]
    async fn stops_after_inner_error() {
        let inner = stream::iter(vec![
            Ok(1),
            Err(std::io::Error::other("reset")),
            Ok(2),
        ]);
        let items: Vec<_> = with_idle_timeout(inner, Duration::from_secs(1)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }
}
