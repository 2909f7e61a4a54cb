//! Device position with a reuse window.

use std::time::Duration;

use async_trait::async_trait;
use commute_core::GeoPoint;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Why no fix could be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Source of the current position.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, PositionError>;
}

/// Always answers with the same point.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub GeoPoint);

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> Result<GeoPoint, PositionError> {
        Ok(self.0)
    }
}

/// A device without positioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosition;

#[async_trait]
impl PositionProvider for NoPosition {
    async fn current_position(&self) -> Result<GeoPoint, PositionError> {
        Err(PositionError::Unavailable("no position provider configured".to_string()))
    }
}

/// Reuses a successful fix for `ttl`. Failures are not cached.
pub struct CachedPosition<P> {
    inner: P,
    ttl: Duration,
    last: Mutex<Option<(Instant, GeoPoint)>>,
}

impl<P: PositionProvider> CachedPosition<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            last: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: PositionProvider> PositionProvider for CachedPosition<P> {
    async fn current_position(&self) -> Result<GeoPoint, PositionError> {
        let mut last = self.last.lock().await;
        if let Some((at, point)) = *last {
            if at.elapsed() < self.ttl {
                debug!("Reusing cached position {}", point);
                return Ok(point);
            }
        }

        let point = self.inner.current_position().await?;
        *last = Some((Instant::now(), point));
        Ok(point)
    }
}

/// The current position, or `None` for every failure.
pub async fn locate(provider: &dyn PositionProvider) -> Option<GeoPoint> {
    match provider.current_position().await {
        Ok(point) => Some(point),
        Err(e) => {
            warn!("Continuing without a position: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PositionProvider for CountingProvider {
        async fn current_position(&self) -> Result<GeoPoint, PositionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PositionError::PermissionDenied)
            } else {
                Ok(GeoPoint::new(25.0, 121.5))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_serves_hits_within_ttl() {
        let cached = CachedPosition::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::from_secs(30 * 60),
        );

        cached.current_position().await.unwrap();
        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        cached.current_position().await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        cached.current_position().await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cached = CachedPosition::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            Duration::from_secs(60),
        );

        assert_eq!(locate(&cached).await, None);
        assert_eq!(locate(&cached).await, None);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fixed_and_missing_providers() {
        let point = GeoPoint::new(24.95, 121.22);
        assert_eq!(locate(&FixedPosition(point)).await, Some(point));
        assert_eq!(locate(&NoPosition).await, None);
    }
}
