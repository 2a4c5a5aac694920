use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe sink for failures reported by batch workers.
///
/// Holds two independent pieces of state: the messages of the current batch,
/// which [`ErrorCollector::drain`] empties, and a lifetime error count, which
/// only [`ErrorCollector::reset_lifetime_count`] clears.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Mutex<Vec<String>>,
    lifetime_count: AtomicUsize,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&self, message: impl Into<String>) {
        self.messages().push(message.into());
        self.lifetime_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn has_errors(&self) -> bool {
        !self.messages().is_empty()
    }

    /// Copies of the messages collected since the last drain.
    pub fn errors(&self) -> Vec<String> {
        self.messages().clone()
    }

    /// Returns and clears the current messages. The lifetime count is kept.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages())
    }

    pub fn lifetime_count(&self) -> usize {
        self.lifetime_count.load(Ordering::SeqCst)
    }

    /// Zeroes the lifetime count without touching any pending messages.
    pub fn reset_lifetime_count(&self) {
        self.lifetime_count.store(0, Ordering::SeqCst);
    }

    // A worker that panicked while pushing cannot leave the Vec half-written,
    // so a poisoned lock is still safe to use.
    fn messages(&self) -> MutexGuard<'_, Vec<String>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_keeps_lifetime_count() {
        let collector = ErrorCollector::new();
        collector.add_error("first");
        collector.add_error("second");

        assert!(collector.has_errors());
        assert_eq!(collector.drain(), vec!["first", "second"]);
        assert!(!collector.has_errors());
        assert_eq!(collector.lifetime_count(), 2);

        collector.add_error("third");
        assert_eq!(collector.lifetime_count(), 3);
    }

    #[test]
    fn test_reset_keeps_messages() {
        let collector = ErrorCollector::new();
        collector.add_error("pending");
        collector.reset_lifetime_count();

        assert_eq!(collector.lifetime_count(), 0);
        assert_eq!(collector.errors(), vec!["pending"]);
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let collector = Arc::new(ErrorCollector::new());
        let writers: Vec<_> = (0..8)
            .map(|worker| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for i in 0..250 {
                        collector.add_error(format!("worker {worker} error {i}"));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(collector.lifetime_count(), 2000);
        assert_eq!(collector.drain().len(), 2000);
    }
}
