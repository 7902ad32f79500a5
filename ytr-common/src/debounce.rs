//! Debounced task dispatch
//!
//! Each call to [`Debouncer::schedule`] cancels the previously armed task and
//! arms a new one that runs after the quiescence window elapses. A burst of
//! calls therefore collapses into a single run of the last task.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Cancellable delayed task, re-armed on every call
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    armed: Option<CancellationToken>,
}

impl Debouncer {
    /// Create a debouncer with a fixed quiescence window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: None,
        }
    }

    /// Arm `task` to run once the window elapses without another schedule
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let window = self.window;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    trace!("Debounced task superseded");
                }
                _ = tokio::time::sleep(window) => {
                    task.await;
                }
            }
        });

        self.armed = Some(token);
    }

    /// Cancel the armed task, if any
    ///
    /// A task whose window already elapsed runs to completion.
    pub fn cancel(&mut self) {
        if let Some(token) = self.armed.take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_task() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let fired = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let fired = Arc::clone(&fired);
            debouncer.schedule(async move {
                fired.lock().unwrap().push(i);
            });
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock().unwrap(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_only_after_quiescence() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        debouncer.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_fire_separately() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let c = Arc::clone(&count);
            debouncer.schedule(async move {
                c.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(150)).await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_disarm() {
        let count = Arc::new(AtomicUsize::new(0));

        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        let c = Arc::clone(&count);
        debouncer.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();

        let c = Arc::clone(&count);
        let mut dropped = Debouncer::new(Duration::from_millis(50));
        dropped.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
