use crate::error::FutureError;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// The result of a computation that completes at most once.
pub trait BlockingFuture {
    type Output;

    /// Returns `false` if the future had already completed.
    fn cancel(&self, may_interrupt_if_running: bool) -> bool;
    fn is_cancelled(&self) -> bool;
    fn is_done(&self) -> bool;

    /// Blocks until the future completes.
    fn get(&self) -> Result<Self::Output, FutureError>;

    /// Blocks for at most `timeout`, failing with [`FutureError::TimedOut`].
    fn get_timeout(&self, timeout: Duration) -> Result<Self::Output, FutureError>;
}

enum Slot<T> {
    Pending,
    Value(T),
    Failed(String),
    Cancelled,
}

impl<T: Clone> Slot<T> {
    fn outcome(&self) -> Option<Result<T, FutureError>> {
        match self {
            Slot::Pending => None,
            Slot::Value(value) => Some(Ok(value.clone())),
            Slot::Failed(message) => Some(Err(FutureError::Failed(message.clone()))),
            Slot::Cancelled => Some(Err(FutureError::Cancelled)),
        }
    }
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    done: Condvar,
}

/// A future completed by calling [`set`](Self::set) or
/// [`set_error`](Self::set_error). Clones share the same result.
pub struct SettableFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SettableFuture<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for SettableFuture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SettableFuture<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Pending),
                done: Condvar::new(),
            }),
        }
    }

    /// Completes the future with `value`. Returns `false` if it was already
    /// complete, in which case `value` is dropped.
    pub fn set(&self, value: T) -> bool {
        self.complete(Slot::Value(value))
    }

    pub fn set_error(&self, message: impl Into<String>) -> bool {
        self.complete(Slot::Failed(message.into()))
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, outcome: Slot<T>) -> bool {
        let mut slot = self.lock();
        if !matches!(*slot, Slot::Pending) {
            return false;
        }
        *slot = outcome;
        self.shared.done.notify_all();
        true
    }
}

impl<T: Clone> BlockingFuture for SettableFuture<T> {
    type Output = T;

    fn cancel(&self, _may_interrupt_if_running: bool) -> bool {
        self.complete(Slot::Cancelled)
    }

    fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), Slot::Cancelled)
    }

    fn is_done(&self) -> bool {
        !matches!(*self.lock(), Slot::Pending)
    }

    fn get(&self) -> Result<T, FutureError> {
        let slot = self
            .shared
            .done
            .wait_while(self.lock(), |slot| matches!(slot, Slot::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        slot.outcome().unwrap_or(Err(FutureError::Cancelled))
    }

    fn get_timeout(&self, timeout: Duration) -> Result<T, FutureError> {
        let (slot, _) = self
            .shared
            .done
            .wait_timeout_while(self.lock(), timeout, |slot| matches!(slot, Slot::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        slot.outcome().unwrap_or(Err(FutureError::TimedOut))
    }
}

type OutputOf<F> = <<F as ForwardingFuture>::Delegate as BlockingFuture>::Output;

/// A [`BlockingFuture`] decorator that forwards to its delegate unless an
/// operation is overridden.
///
/// Implementors are normally used through the base trait. With both traits
/// in scope a call like `future.get()` is ambiguous; name the trait instead,
/// e.g. `BlockingFuture::get(&future)`.
pub trait ForwardingFuture {
    type Delegate: BlockingFuture;

    fn delegate(&self) -> &Self::Delegate;

    fn cancel(&self, may_interrupt_if_running: bool) -> bool {
        self.delegate().cancel(may_interrupt_if_running)
    }

    fn is_cancelled(&self) -> bool {
        self.delegate().is_cancelled()
    }

    fn is_done(&self) -> bool {
        self.delegate().is_done()
    }

    fn get(&self) -> Result<OutputOf<Self>, FutureError> {
        self.delegate().get()
    }

    fn get_timeout(&self, timeout: Duration) -> Result<OutputOf<Self>, FutureError> {
        self.delegate().get_timeout(timeout)
    }
}

impl<F: ForwardingFuture> BlockingFuture for F {
    type Output = OutputOf<F>;

    fn cancel(&self, may_interrupt_if_running: bool) -> bool {
        ForwardingFuture::cancel(self, may_interrupt_if_running)
    }

    fn is_cancelled(&self) -> bool {
        ForwardingFuture::is_cancelled(self)
    }

    fn is_done(&self) -> bool {
        ForwardingFuture::is_done(self)
    }

    fn get(&self) -> Result<Self::Output, FutureError> {
        ForwardingFuture::get(self)
    }

    fn get_timeout(&self, timeout: Duration) -> Result<Self::Output, FutureError> {
        ForwardingFuture::get_timeout(self, timeout)
    }
}
