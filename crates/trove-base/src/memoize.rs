use crate::error::BaseError;
use crate::supplier::Supplier;
use crate::time::{Clock, SystemClock};
use log::trace;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Caches the first value its delegate produces.
///
/// The slot is guarded by a mutex held across the delegate call, so
/// concurrent callers see at most one computation. If the delegate panics
/// the slot stays empty and the next call retries.
pub struct MemoizingSupplier<S, T> {
    delegate: S,
    value: Mutex<Option<T>>,
}

impl<S, T> Supplier<T> for MemoizingSupplier<S, T>
where
    S: Supplier<T>,
    T: Clone,
{
    fn get(&self) -> T {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = slot.as_ref() {
            return value.clone();
        }
        trace!("memoized supplier: computing value");
        let value = self.delegate.get();
        *slot = Some(value.clone());
        value
    }
}

pub fn memoize<S, T>(delegate: S) -> MemoizingSupplier<S, T>
where
    S: Supplier<T>,
    T: Clone,
{
    MemoizingSupplier {
        delegate,
        value: Mutex::new(None),
    }
}

struct Cached<T> {
    value: T,
    // `None` when the expiry is past the clock's range.
    expires_at: Option<Instant>,
}

/// Like [`MemoizingSupplier`], but the value goes stale `duration` after it
/// was computed and the next call recomputes it.
pub struct ExpiringMemoizingSupplier<S, T, C = SystemClock> {
    delegate: S,
    duration: Duration,
    clock: C,
    slot: Mutex<Option<Cached<T>>>,
}

impl<S, T, C> ExpiringMemoizingSupplier<S, T, C> {
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl<S, T, C> Supplier<T> for ExpiringMemoizingSupplier<S, T, C>
where
    S: Supplier<T>,
    T: Clone,
    C: Clock,
{
    fn get(&self) -> T {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref() {
            match cached.expires_at {
                Some(expires_at) if self.clock.now() < expires_at => {
                    return cached.value.clone()
                }
                None => return cached.value.clone(),
                Some(_) => trace!("expiring supplier: cached value is stale"),
            }
        }

        let value = self.delegate.get();
        let expires_at = self.clock.now().checked_add(self.duration);
        *slot = Some(Cached {
            value: value.clone(),
            expires_at,
        });
        value
    }
}

pub fn memoize_with_expiration<S, T>(
    delegate: S,
    duration: Duration,
) -> Result<ExpiringMemoizingSupplier<S, T>, BaseError>
where
    S: Supplier<T>,
    T: Clone,
{
    memoize_with_expiration_and_clock(delegate, duration, SystemClock)
}

/// [`memoize_with_expiration`] measuring time with `clock`.
pub fn memoize_with_expiration_and_clock<S, T, C>(
    delegate: S,
    duration: Duration,
    clock: C,
) -> Result<ExpiringMemoizingSupplier<S, T, C>, BaseError>
where
    S: Supplier<T>,
    T: Clone,
    C: Clock,
{
    if duration.is_zero() {
        return Err(BaseError::NonPositiveDuration);
    }
    Ok(ExpiringMemoizingSupplier {
        delegate,
        duration,
        clock,
        slot: Mutex::new(None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Instant::now()),
            })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn counting() -> (Arc<AtomicUsize>, impl Fn() -> usize + Send + Sync) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        (calls, move || counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[test]
    fn memoize_computes_once() {
        let (calls, delegate) = counting();
        let memo = memoize(delegate);
        assert_eq!(memo.get(), 1);
        assert_eq!(memo.get(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn memoize_computes_once_under_contention() {
        let (calls, delegate) = counting();
        let memo = Arc::new(memoize(move || {
            thread::yield_now();
            delegate()
        }));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = memo.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    memo.get()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn memoize_retries_after_panic() {
        let attempts = AtomicUsize::new(0);
        let memo = memoize(|| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first attempt fails");
            }
            "ready"
        });

        let first = panic::catch_unwind(AssertUnwindSafe(|| memo.get()));
        assert!(first.is_err());
        assert_eq!(memo.get(), "ready");
        assert_eq!(memo.get(), "ready");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn expiration_must_be_positive() {
        assert_eq!(
            memoize_with_expiration(|| 0, Duration::ZERO).err(),
            Some(BaseError::NonPositiveDuration)
        );
    }

    #[test]
    fn expiring_value_is_recomputed_once_stale() {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new();
        let (calls, delegate) = counting();
        let memo =
            memoize_with_expiration_and_clock(delegate, Duration::from_secs(10), clock.clone())
                .unwrap();
        assert_eq!(memo.duration(), Duration::from_secs(10));

        assert_eq!(memo.get(), 1);
        clock.advance(Duration::from_secs(9));
        assert_eq!(memo.get(), 1);

        // Stale exactly at the deadline.
        clock.advance(Duration::from_secs(1));
        assert_eq!(memo.get(), 2);
        assert_eq!(memo.get(), 2);

        clock.advance(Duration::from_secs(25));
        assert_eq!(memo.get(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn expiring_supplier_with_system_clock() {
        let (calls, delegate) = counting();
        let memo = memoize_with_expiration(delegate, Duration::from_secs(3600)).unwrap();
        assert_eq!(memo.get(), 1);
        assert_eq!(memo.get(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
