use crate::error::ConcurrentError;
use crate::future::{BlockingFuture, SettableFuture};
use crate::thread_factory::{panic_message, DefaultThreadFactory, ThreadFactory};
use log::{info, warn};
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    New,
    Starting,
    Running,
    Stopping,
    Terminated,
    Failed,
}

/// An object with an operational state and asynchronous start/stop.
///
/// `start` and `stop` return futures that complete with the state reached:
/// `Running` for start, `Terminated` for stop. A service that fails
/// completes both with an error.
pub trait Service: Send + Sync {
    fn start(&self) -> SettableFuture<State>;
    fn state(&self) -> State;
    fn stop(&self) -> SettableFuture<State>;

    fn start_and_wait(&self) -> Result<State, ConcurrentError> {
        Ok(self.start().get()?)
    }

    fn stop_and_wait(&self) -> Result<State, ConcurrentError> {
        Ok(self.stop().get()?)
    }

    fn is_running(&self) -> bool {
        self.state() == State::Running
    }
}

pub type LifecycleError = Box<dyn Error + Send + Sync>;

/// The blocking work behind an [`IdleService`].
pub trait Lifecycle: Send + Sync + 'static {
    fn start_up(&self) -> Result<(), LifecycleError>;
    fn shut_down(&self) -> Result<(), LifecycleError>;
}

struct Status {
    state: State,
    stop_requested: bool,
}

struct Inner<L> {
    name: String,
    lifecycle: L,
    factory: Box<dyn ThreadFactory>,
    status: Mutex<Status>,
    started: SettableFuture<State>,
    stopped: SettableFuture<State>,
}

/// A [`Service`] that does no work while running; `start_up` and
/// `shut_down` each run on a fresh thread from the service's factory.
pub struct IdleService<L> {
    inner: Arc<Inner<L>>,
}

impl<L: Lifecycle> IdleService<L> {
    pub fn new(name: impl Into<String>, lifecycle: L) -> Self {
        Self::with_thread_factory(name, lifecycle, DefaultThreadFactory)
    }

    pub fn with_thread_factory(
        name: impl Into<String>,
        lifecycle: L,
        factory: impl ThreadFactory + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                lifecycle,
                factory: Box::new(factory),
                status: Mutex::new(Status {
                    state: State::New,
                    stop_requested: false,
                }),
                started: SettableFuture::new(),
                stopped: SettableFuture::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn lifecycle(&self) -> &L {
        &self.inner.lifecycle
    }
}

impl<L: Lifecycle> Inner<L> {
    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, status: &mut Status, to: State) {
        info!("service {}: {:?} -> {:?}", self.name, status.state, to);
        status.state = to;
    }

    fn fail(&self, status: &mut Status, message: String) {
        warn!("service {} failed: {}", self.name, message);
        self.transition(status, State::Failed);
        self.started.set_error(message.clone());
        self.stopped.set_error(message);
    }

    fn spawn(self: &Arc<Self>, work: fn(&Arc<Self>)) {
        let this = self.clone();
        if let Err(e) = self.factory.new_thread(Box::new(move || work(&this))) {
            self.fail(&mut self.status(), format!("could not spawn thread: {e}"));
        }
    }

    fn run_start_up(self: &Arc<Self>) {
        let result = run_hook(|| self.lifecycle.start_up());
        let mut status = self.status();
        match result {
            Ok(()) => {
                self.transition(&mut status, State::Running);
                self.started.set(State::Running);
                if status.stop_requested {
                    self.transition(&mut status, State::Stopping);
                    drop(status);
                    self.run_shut_down();
                }
            }
            Err(message) => self.fail(&mut status, message),
        }
    }

    fn run_shut_down(self: &Arc<Self>) {
        let result = run_hook(|| self.lifecycle.shut_down());
        let mut status = self.status();
        match result {
            Ok(()) => {
                self.transition(&mut status, State::Terminated);
                self.stopped.set(State::Terminated);
            }
            Err(message) => self.fail(&mut status, message),
        }
    }
}

// A panicking hook fails the service like an `Err` return.
fn run_hook(hook: impl FnOnce() -> Result<(), LifecycleError>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => Err(panic_message(&*payload)),
    }
}

impl<L: Lifecycle> Service for IdleService<L> {
    fn start(&self) -> SettableFuture<State> {
        let mut status = self.inner.status();
        if status.state == State::New {
            self.inner.transition(&mut status, State::Starting);
            drop(status);
            self.inner.spawn(Inner::run_start_up);
        }
        self.inner.started.clone()
    }

    fn state(&self) -> State {
        self.inner.status().state
    }

    fn stop(&self) -> SettableFuture<State> {
        let mut status = self.inner.status();
        match status.state {
            State::New => {
                self.inner.transition(&mut status, State::Terminated);
                self.inner.started.set(State::Terminated);
                self.inner.stopped.set(State::Terminated);
            }
            State::Starting => status.stop_requested = true,
            State::Running => {
                self.inner.transition(&mut status, State::Stopping);
                drop(status);
                self.inner.spawn(Inner::run_shut_down);
            }
            State::Stopping | State::Terminated | State::Failed => {}
        }
        self.inner.stopped.clone()
    }
}

/// A [`Service`] decorator that forwards to its delegate unless an
/// operation is overridden.
///
/// Implementors are normally used through the base trait. With both traits
/// in scope a call like `service.state()` is ambiguous; name the trait instead,
/// e.g. `Service::state(&service)`.
pub trait ForwardingService: Send + Sync {
    type Delegate: Service;

    fn delegate(&self) -> &Self::Delegate;

    fn start(&self) -> SettableFuture<State> {
        self.delegate().start()
    }

    fn state(&self) -> State {
        self.delegate().state()
    }

    fn stop(&self) -> SettableFuture<State> {
        self.delegate().stop()
    }

    fn start_and_wait(&self) -> Result<State, ConcurrentError> {
        self.delegate().start_and_wait()
    }

    fn stop_and_wait(&self) -> Result<State, ConcurrentError> {
        self.delegate().stop_and_wait()
    }

    fn is_running(&self) -> bool {
        self.delegate().is_running()
    }
}

impl<S: ForwardingService> Service for S {
    fn start(&self) -> SettableFuture<State> {
        ForwardingService::start(self)
    }

    fn state(&self) -> State {
        ForwardingService::state(self)
    }

    fn stop(&self) -> SettableFuture<State> {
        ForwardingService::stop(self)
    }

    fn start_and_wait(&self) -> Result<State, ConcurrentError> {
        ForwardingService::start_and_wait(self)
    }

    fn stop_and_wait(&self) -> Result<State, ConcurrentError> {
        ForwardingService::stop_and_wait(self)
    }

    fn is_running(&self) -> bool {
        ForwardingService::is_running(self)
    }
}
