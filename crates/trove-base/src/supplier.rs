use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

/// Produces values of `T` on demand.
///
/// Every `Fn() -> T` closure is a supplier.
pub trait Supplier<T> {
    fn get(&self) -> T;
}

impl<T, F> Supplier<T> for F
where
    F: Fn() -> T,
{
    fn get(&self) -> T {
        self()
    }
}

/// Supplies clones of a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierOfInstance<T> {
    instance: T,
}

impl<T: Clone> Supplier<T> for SupplierOfInstance<T> {
    fn get(&self) -> T {
        self.instance.clone()
    }
}

pub fn of_instance<T: Clone>(instance: T) -> SupplierOfInstance<T> {
    SupplierOfInstance { instance }
}

/// Applies a function to every value a supplier produces.
pub struct SupplierComposition<F, S, A> {
    function: F,
    supplier: S,
    _input: PhantomData<fn() -> A>,
}

impl<A, T, F, S> Supplier<T> for SupplierComposition<F, S, A>
where
    F: Fn(A) -> T,
    S: Supplier<A>,
{
    fn get(&self) -> T {
        (self.function)(self.supplier.get())
    }
}

pub fn compose<A, T, F, S>(function: F, supplier: S) -> SupplierComposition<F, S, A>
where
    F: Fn(A) -> T,
    S: Supplier<A>,
{
    SupplierComposition {
        function,
        supplier,
        _input: PhantomData,
    }
}

/// Serializes every call to the wrapped supplier.
pub struct SynchronizedSupplier<S> {
    delegate: S,
    lock: Mutex<()>,
}

impl<T, S: Supplier<T>> Supplier<T> for SynchronizedSupplier<S> {
    fn get(&self) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.delegate.get()
    }
}

pub fn synchronized_supplier<S>(delegate: S) -> SynchronizedSupplier<S> {
    SynchronizedSupplier {
        delegate,
        lock: Mutex::new(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn closures_are_suppliers() {
        let s = || 7;
        assert_eq!(s.get(), 7);
    }

    #[test]
    fn of_instance_returns_same_value() {
        let s = of_instance(String::from("fixed"));
        assert_eq!(s.get(), "fixed");
        assert_eq!(s.get(), "fixed");
    }

    #[test]
    fn compose_applies_function_per_call() {
        let counter = Cell::new(0);
        let next = || {
            counter.set(counter.get() + 1);
            counter.get()
        };
        let doubled = compose(|n: i32| n * 2, next);
        assert_eq!(doubled.get(), 2);
        assert_eq!(doubled.get(), 4);
    }

    #[test]
    fn synchronized_supplier_excludes_concurrent_calls() {
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let supplier = {
            let inside = inside.clone();
            let overlaps = overlaps.clone();
            Arc::new(synchronized_supplier(move || {
                if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                thread::yield_now();
                inside.fetch_sub(1, Ordering::SeqCst);
            }))
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let supplier = supplier.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        supplier.get();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
