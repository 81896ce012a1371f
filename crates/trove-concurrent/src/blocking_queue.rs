use crate::error::ConcurrentError;
use log::trace;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A FIFO queue whose producers and consumers may block.
///
/// Non-blocking `offer` hands the item back when the queue is full.
pub trait BlockingQueue {
    type Item;

    fn offer(&self, item: Self::Item) -> Result<(), Self::Item>;
    fn offer_timeout(&self, item: Self::Item, timeout: Duration) -> Result<(), Self::Item>;

    /// Waits for space.
    fn put(&self, item: Self::Item);

    fn poll(&self) -> Option<Self::Item>;
    fn poll_timeout(&self, timeout: Duration) -> Option<Self::Item>;

    /// Waits for an item.
    fn take(&self) -> Self::Item;

    fn remaining_capacity(&self) -> usize;

    /// Moves every queued item into `sink`, returning how many moved.
    fn drain_to(&self, sink: &mut Vec<Self::Item>) -> usize;
    fn drain_to_max(&self, sink: &mut Vec<Self::Item>, max: usize) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A bounded [`BlockingQueue`] backed by a ring buffer.
pub struct ArrayBlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> ArrayBlockingQueue<T> {
    pub fn new(capacity: usize) -> Result<Self, ConcurrentError> {
        if capacity == 0 {
            return Err(ConcurrentError::ZeroCapacity);
        }
        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, items: &mut VecDeque<T>, item: T) {
        items.push_back(item);
        self.not_empty.notify_one();
    }

    fn pop(&self, items: &mut VecDeque<T>) -> Option<T> {
        let item = items.pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }
}

impl<T> BlockingQueue for ArrayBlockingQueue<T> {
    type Item = T;

    fn offer(&self, item: T) -> Result<(), T> {
        let mut items = self.lock();
        if items.len() == self.capacity {
            return Err(item);
        }
        self.push(&mut items, item);
        Ok(())
    }

    fn offer_timeout(&self, item: T, timeout: Duration) -> Result<(), T> {
        let (mut items, _) = self
            .not_full
            .wait_timeout_while(self.lock(), timeout, |items| items.len() == self.capacity)
            .unwrap_or_else(PoisonError::into_inner);
        if items.len() == self.capacity {
            trace!("offer timed out after {:?}", timeout);
            return Err(item);
        }
        self.push(&mut items, item);
        Ok(())
    }

    fn put(&self, item: T) {
        let mut items = self
            .not_full
            .wait_while(self.lock(), |items| items.len() == self.capacity)
            .unwrap_or_else(PoisonError::into_inner);
        self.push(&mut items, item);
    }

    fn poll(&self) -> Option<T> {
        let mut items = self.lock();
        self.pop(&mut items)
    }

    fn poll_timeout(&self, timeout: Duration) -> Option<T> {
        let (mut items, _) = self
            .not_empty
            .wait_timeout_while(self.lock(), timeout, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        self.pop(&mut items)
    }

    fn take(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = self.pop(&mut items) {
                return item;
            }
            items = self
                .not_empty
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn remaining_capacity(&self) -> usize {
        self.capacity - self.lock().len()
    }

    fn drain_to(&self, sink: &mut Vec<T>) -> usize {
        self.drain_to_max(sink, usize::MAX)
    }

    fn drain_to_max(&self, sink: &mut Vec<T>, max: usize) -> usize {
        let mut items = self.lock();
        let n = max.min(items.len());
        sink.extend(items.drain(..n));
        if n > 0 {
            self.not_full.notify_all();
        }
        n
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

type ItemOf<Q> = <<Q as ForwardingBlockingQueue>::Delegate as BlockingQueue>::Item;

/// A [`BlockingQueue`] decorator that forwards to its delegate unless an
/// operation is overridden.
///
/// Implementors are normally used through the base trait. With both traits
/// in scope a call like `queue.len()` is ambiguous; name the trait instead,
/// e.g. `BlockingQueue::len(&queue)`.
pub trait ForwardingBlockingQueue {
    type Delegate: BlockingQueue;

    fn delegate(&self) -> &Self::Delegate;

    fn offer(&self, item: ItemOf<Self>) -> Result<(), ItemOf<Self>> {
        self.delegate().offer(item)
    }

    fn offer_timeout(&self, item: ItemOf<Self>, timeout: Duration) -> Result<(), ItemOf<Self>> {
        self.delegate().offer_timeout(item, timeout)
    }

    fn put(&self, item: ItemOf<Self>) {
        self.delegate().put(item)
    }

    fn poll(&self) -> Option<ItemOf<Self>> {
        self.delegate().poll()
    }

    fn poll_timeout(&self, timeout: Duration) -> Option<ItemOf<Self>> {
        self.delegate().poll_timeout(timeout)
    }

    fn take(&self) -> ItemOf<Self> {
        self.delegate().take()
    }

    fn remaining_capacity(&self) -> usize {
        self.delegate().remaining_capacity()
    }

    fn drain_to(&self, sink: &mut Vec<ItemOf<Self>>) -> usize {
        self.delegate().drain_to(sink)
    }

    fn drain_to_max(&self, sink: &mut Vec<ItemOf<Self>>, max: usize) -> usize {
        self.delegate().drain_to_max(sink, max)
    }

    fn len(&self) -> usize {
        self.delegate().len()
    }

    fn is_empty(&self) -> bool {
        self.delegate().is_empty()
    }
}

impl<Q: ForwardingBlockingQueue> BlockingQueue for Q {
    type Item = ItemOf<Q>;

    fn offer(&self, item: Self::Item) -> Result<(), Self::Item> {
        ForwardingBlockingQueue::offer(self, item)
    }

    fn offer_timeout(&self, item: Self::Item, timeout: Duration) -> Result<(), Self::Item> {
        ForwardingBlockingQueue::offer_timeout(self, item, timeout)
    }

    fn put(&self, item: Self::Item) {
        ForwardingBlockingQueue::put(self, item)
    }

    fn poll(&self) -> Option<Self::Item> {
        ForwardingBlockingQueue::poll(self)
    }

    fn poll_timeout(&self, timeout: Duration) -> Option<Self::Item> {
        ForwardingBlockingQueue::poll_timeout(self, timeout)
    }

    fn take(&self) -> Self::Item {
        ForwardingBlockingQueue::take(self)
    }

    fn remaining_capacity(&self) -> usize {
        ForwardingBlockingQueue::remaining_capacity(self)
    }

    fn drain_to(&self, sink: &mut Vec<Self::Item>) -> usize {
        ForwardingBlockingQueue::drain_to(self, sink)
    }

    fn drain_to_max(&self, sink: &mut Vec<Self::Item>, max: usize) -> usize {
        ForwardingBlockingQueue::drain_to_max(self, sink, max)
    }

    fn len(&self) -> usize {
        ForwardingBlockingQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        ForwardingBlockingQueue::is_empty(self)
    }
}
