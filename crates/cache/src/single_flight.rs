//! Request coalescing
//!
//! Concurrent callers asking for the same key share a single in-flight
//! computation. The slot is dropped as soon as the computation finishes, so
//! later callers start a fresh one (normally served from cache by then).
//! Only successful results are shared: if the caller running the computation
//! fails or is cancelled, the next waiter runs its own.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Map of in-flight computations keyed by cache key
pub struct SingleFlight<T> {
    in_flight: DashMap<String, Arc<OnceCell<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` for `key` unless another caller is already running it, in
    /// which case wait for and share that caller's result.
    ///
    /// An `Err` is returned to the caller that produced it and never shared.
    pub async fn run<F, Fut, E>(&self, key: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self
            .in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        // Releases the slot even when this future is dropped mid-flight
        let slot = Slot {
            in_flight: &self.in_flight,
            key,
            cell,
        };

        let value = slot.cell.get_or_try_init(f).await;
        value.cloned()
    }

    /// Number of keys with a computation in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

struct Slot<'a, T> {
    in_flight: &'a DashMap<String, Arc<OnceCell<T>>>,
    key: &'a str,
    cell: Arc<OnceCell<T>>,
}

impl<T> Drop for Slot<'_, T> {
    fn drop(&mut self) {
        // An unfilled cell stays while waiters still hold it, so one of them
        // picks the work up instead of a newcomer starting a parallel run.
        // Two references left means only the map and this slot.
        self.in_flight.remove_if(self.key, |_, current| {
            Arc::ptr_eq(current, &self.cell)
                && (current.initialized() || Arc::strong_count(current) <= 2)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let flights: SingleFlight<u32> = SingleFlight::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let work = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<u32, ()>(7)
        };

        let results = futures::future::join_all((0..5).map(|_| flights.run("same", work))).await;

        assert_eq!(results, vec![Ok(7); 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flights: SingleFlight<String> = SingleFlight::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let (a, b) = tokio::join!(
            flights.run("a", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("a".to_string())
            }),
            flights.run("b", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("b".to_string())
            }),
        );

        assert_eq!((a.unwrap().as_str(), b.unwrap().as_str()), ("a", "b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flights: SingleFlight<usize> = SingleFlight::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for expected in 1..=3 {
            let n = flights
                .run("k", move || async move {
                    Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .await;
            assert_eq!(n, Ok(expected));
        }
    }

    #[tokio::test]
    async fn test_failed_run_is_not_shared() {
        let flights: SingleFlight<u32> = SingleFlight::new();

        let (first, second) = tokio::join!(
            flights.run("k", || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err("upstream down")
            }),
            flights.run("k", || async { Ok::<_, &str>(9) }),
        );

        assert_eq!(first, Err("upstream down"));
        assert_eq!(second, Ok(9));
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_hands_over_to_waiter() {
        let flights: SingleFlight<u32> = SingleFlight::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let leader = flights.run("k", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ()>(1)
        });
        let waiter = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            flights
                .run("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(2)
                })
                .await
        };

        // The leader is dropped at the timeout, the waiter then runs its own work
        let (leader, waiter) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(20), leader),
            waiter
        );

        assert!(leader.is_err());
        assert_eq!(waiter, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_without_waiters_frees_slot() {
        let flights: SingleFlight<u32> = SingleFlight::new();

        let run = flights.run("k", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ()>(1)
        });
        assert!(tokio::time::timeout(Duration::from_millis(5), run).await.is_err());

        assert_eq!(flights.in_flight(), 0);
    }
}
