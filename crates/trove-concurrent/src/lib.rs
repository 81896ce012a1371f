pub mod blocking_queue;
pub mod error;
pub mod future;
pub mod service;
pub mod thread_factory;

// The `Forwarding*` traits are reached through their modules so that a glob
// import of this crate does not bring two traits with identical method
// names into scope.
pub use blocking_queue::{ArrayBlockingQueue, BlockingQueue};
pub use error::*;
pub use future::{BlockingFuture, SettableFuture};
pub use service::{IdleService, Lifecycle, LifecycleError, Service, State};
pub use thread_factory::*;
