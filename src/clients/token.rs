//! # Access Token Cache
//!
//! Explicit token cache owned by the accounting gateway client. The
//! cached token lives behind one async mutex; a refresh executes while
//! the lock is held, so any number of concurrent callers share a single
//! in-flight refresh instead of issuing duplicate token requests.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

/// A bearer token with its absolute expiry
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Expiry-aware token slot with a single-flight refresh guarantee
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
    refresh_margin: Duration,
}

impl TokenCache {
    /// Create a cache that refreshes `refresh_margin_seconds` before expiry
    pub fn new(refresh_margin_seconds: i64) -> Self {
        Self {
            slot: Mutex::new(None),
            refresh_margin: Duration::seconds(refresh_margin_seconds),
        }
    }

    /// Return a valid access token, invoking `refresh` when the cached one
    /// is absent or within the refresh margin of expiry.
    ///
    /// The refresh future runs while the slot lock is held: concurrent
    /// callers queue on the lock and observe the freshly stored token
    /// rather than refreshing again.
    pub async fn access_token<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedToken>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.as_ref() {
            if token.expires_at - self.refresh_margin > Utc::now() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached access token within refresh margin; refreshing");
        }

        let fresh = refresh().await?;
        let access_token = fresh.access_token.clone();
        *slot = Some(fresh);

        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn token_valid_for(seconds: i64) -> CachedToken {
        CachedToken {
            access_token: format!("token-{seconds}"),
            expires_at: Utc::now() + Duration::seconds(seconds),
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let cache = Arc::new(TokenCache::new(60));
        let refresh_count = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let refresh_count = Arc::clone(&refresh_count);
            handles.push(tokio::spawn(async move {
                cache
                    .access_token(|| async move {
                        refresh_count.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        Ok(token_valid_for(3600))
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "token-3600");
        }
        assert_eq!(refresh_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed() {
        let cache = TokenCache::new(60);

        // Seed with a token already inside the refresh margin
        let first = cache
            .access_token(|| async { Ok(token_valid_for(10)) })
            .await
            .unwrap();
        assert_eq!(first, "token-10");

        let second = cache
            .access_token(|| async { Ok(token_valid_for(3600)) })
            .await
            .unwrap();
        assert_eq!(second, "token-3600");
    }

    #[tokio::test]
    async fn fresh_token_is_reused_without_refresh() {
        let cache = TokenCache::new(60);

        cache
            .access_token(|| async { Ok(token_valid_for(3600)) })
            .await
            .unwrap();

        let reused = cache
            .access_token(|| async {
                panic!("refresh must not run while the token is fresh")
            })
            .await
            .unwrap();
        assert_eq!(reused, "token-3600");
    }
}
