//! Visited-URL set and pending-task queue
//!
//! The frontier is the single gate through which a URL enters a crawl.
//! [`Frontier::add`] performs the membership check and the insert inside one
//! critical section, so two units that discover the same link at the same
//! time cannot both admit it.

use crate::crawler::model::Task;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Deduplicating work queue for one crawl
pub struct Frontier {
    /// Every URL ever admitted during this crawl
    visited: Mutex<HashSet<String>>,

    sender: UnboundedSender<Task>,

    /// Single consumer; the lock only serializes concurrent `next` callers
    receiver: tokio::sync::Mutex<UnboundedReceiver<Task>>,

    closed: CancellationToken,
}

impl Frontier {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            visited: Mutex::new(HashSet::new()),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            closed: CancellationToken::new(),
        }
    }

    /// Admits a task if its URL has not been seen before
    ///
    /// Returns true if the task was newly admitted and queued. Returns false
    /// if the URL was already visited or the frontier is closed.
    pub fn add(&self, task: Task) -> bool {
        if self.closed.is_cancelled() {
            return false;
        }

        {
            let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
            if !visited.insert(task.url.clone()) {
                return false;
            }
        }

        // The receiver lives as long as `self`, so sending cannot fail here
        self.sender.send(task).is_ok()
    }

    /// Point-in-time membership check
    ///
    /// Only meant for diagnostics. Use [`Frontier::add`] to admit URLs.
    pub fn exists(&self, url: &str) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    /// Waits for the next pending task
    ///
    /// Returns None once the frontier is closed, even if tasks are still
    /// buffered.
    pub async fn next(&self) -> Option<Task> {
        if self.closed.is_cancelled() {
            return None;
        }

        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            task = receiver.recv() => task,
        }
    }

    /// Signals that no more tasks will be produced
    ///
    /// Idempotent. Wakes every pending [`Frontier::next`] call.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of URLs admitted so far
    pub fn visited_count(&self) -> usize {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::model::Depth;
    use std::sync::Arc;
    use std::time::Duration;

    fn task(url: &str) -> Task {
        Task::new(
            url,
            Depth::Unlimited,
            Duration::from_secs(1),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_add_and_next() {
        let frontier = Frontier::new();

        assert!(frontier.add(task("https://example.com/")));
        assert!(frontier.exists("https://example.com/"));

        let next = frontier.next().await.unwrap();
        assert_eq!(next.url, "https://example.com/");
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected() {
        let frontier = Frontier::new();

        assert!(frontier.add(task("https://example.com/a")));
        assert!(!frontier.add(task("https://example.com/a")));
        assert_eq!(frontier.visited_count(), 1);

        frontier.next().await.unwrap();
        // Still rejected after the task was handed out
        assert!(!frontier.add(task("https://example.com/a")));
    }

    #[tokio::test]
    async fn test_tasks_delivered_in_admission_order() {
        let frontier = Frontier::new();
        frontier.add(task("https://example.com/1"));
        frontier.add(task("https://example.com/2"));

        assert_eq!(frontier.next().await.unwrap().url, "https://example.com/1");
        assert_eq!(frontier.next().await.unwrap().url, "https://example.com/2");
    }

    #[tokio::test]
    async fn test_close_unblocks_waiting_next() {
        let frontier = Arc::new(Frontier::new());

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.close();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("next() did not return after close")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_drops_buffered_tasks() {
        let frontier = Frontier::new();
        frontier.add(task("https://example.com/pending"));

        frontier.close();
        frontier.close();

        assert!(frontier.is_closed());
        assert!(frontier.next().await.is_none());
        assert!(!frontier.add(task("https://example.com/late")));
        assert!(!frontier.exists("https://example.com/late"));
    }

    #[tokio::test]
    async fn test_concurrent_adds_admit_once() {
        let frontier = Arc::new(Frontier::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let frontier = Arc::clone(&frontier);
            handles.push(tokio::spawn(async move {
                frontier.add(task("https://example.com/contended"))
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(frontier.visited_count(), 1);
    }
}
