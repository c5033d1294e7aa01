//! Bounded store sessions
//!
//! Every store call runs inside a [`StoreSession`]. Sessions hold a
//! semaphore permit that is returned when the session is dropped, on
//! success, on error and on cancellation alike.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::errors::{StoreError, StoreResult};
use super::DocumentStore;
use crate::definition::Command;

/// Pool bounding the number of concurrent store sessions
#[derive(Clone)]
pub struct SessionPool {
    store: Arc<dyn DocumentStore>,
    permits: Arc<Semaphore>,
    max_sessions: usize,
}

impl SessionPool {
    /// Create a pool allowing `max_sessions` concurrent sessions (at least one)
    pub fn new(store: Arc<dyn DocumentStore>, max_sessions: usize) -> Self {
        let max_sessions = max_sessions.max(1);
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
        }
    }

    /// Wait for a free session
    pub async fn acquire(&self) -> StoreResult<StoreSession> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StoreError::PoolClosed)?;
        Ok(StoreSession {
            store: Arc::clone(&self.store),
            _permit: permit,
        })
    }

    /// Sessions currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Refuse further sessions. Waiting acquirers fail with `PoolClosed`.
    pub fn close(&self) {
        self.permits.close();
    }
}

/// One checked-out store session
pub struct StoreSession {
    store: Arc<dyn DocumentStore>,
    _permit: OwnedSemaphorePermit,
}

impl StoreSession {
    pub async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Command],
    ) -> StoreResult<Vec<Value>> {
        self.store.aggregate(collection, pipeline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn pool(max: usize) -> SessionPool {
        SessionPool::new(Arc::new(InMemoryStore::new()), max)
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let pool = pool(2);
        assert_eq!(pool.available(), 2);

        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        drop(first);
        assert_eq!(pool.available(), 1);
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_zero_sessions_clamped_to_one() {
        let pool = pool(0);
        assert_eq!(pool.max_sessions(), 1);
        let session = pool.acquire().await.unwrap();
        assert!(session.aggregate("stations", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_sessions() {
        let pool = pool(1);
        pool.close();
        assert!(matches!(pool.acquire().await, Err(StoreError::PoolClosed)));
    }
}
