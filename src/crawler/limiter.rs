//! Fetch limiter bounding the number of fetches in flight

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding how many fetches run at once
///
/// Only the fetch step goes through the limiter. Dispatch, parsing and
/// scheduling are not throttled.
#[derive(Debug, Clone)]
pub struct FetchLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held fetch slot, returned to the limiter when dropped
#[derive(Debug)]
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
}

impl FetchPermit {
    /// Returns the slot to the limiter
    pub fn release(self) {}
}

impl FetchLimiter {
    /// Creates a limiter with `capacity` slots
    ///
    /// 0 is treated as 1 and values above the semaphore limit are clamped.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot
    ///
    /// Returns None only if the limiter has been shut down.
    pub async fn acquire(&self) -> Option<FetchPermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .ok()
            .map(|permit| FetchPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_means_serial() {
        let limiter = FetchLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let limiter = FetchLimiter::new(usize::MAX);
        assert_eq!(limiter.capacity(), Semaphore::MAX_PERMITS);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = FetchLimiter::new(2);

        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);

        a.release();
        assert_eq!(limiter.in_flight(), 1);

        drop(b);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_acquire_blocks_when_full() {
        let limiter = FetchLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err());

        held.release();
        let granted = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(matches!(granted, Ok(Some(_))));
    }
}
