use crate::error::ConcurrentError;
use log::debug;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Called with the thread name and panic message when a task panics.
pub type PanicHandler = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Spawns a task on a pre-configured [`thread::Builder`].
pub type Spawner = Arc<dyn Fn(thread::Builder, Task) -> io::Result<JoinHandle<()>> + Send + Sync>;

/// Creates threads on demand.
pub trait ThreadFactory: Send + Sync {
    fn new_thread(&self, task: Task) -> io::Result<JoinHandle<()>>;
}

/// Spawns plain, unnamed threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultThreadFactory;

impl ThreadFactory for DefaultThreadFactory {
    fn new_thread(&self, task: Task) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().spawn(task)
    }
}

/// Builds a [`ThreadFactory`] that names, sizes and supervises the threads
/// it creates.
///
/// ```
/// use trove_concurrent::{ThreadFactory, ThreadFactoryBuilder};
///
/// let factory = ThreadFactoryBuilder::new()
///     .name_format("worker-{}")
///     .unwrap()
///     .build();
/// let handle = factory
///     .new_thread(Box::new(|| assert_eq!(std::thread::current().name(), Some("worker-0"))))
///     .unwrap();
/// handle.join().unwrap();
/// ```
#[derive(Default, Clone)]
pub struct ThreadFactoryBuilder {
    name_format: Option<String>,
    stack_size: Option<usize>,
    panic_handler: Option<PanicHandler>,
    spawner: Option<Spawner>,
}

impl ThreadFactoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `{}` in `format` is replaced by a per-factory counter starting
    /// at 0. Any other brace, or a NUL byte, is rejected here rather than at
    /// spawn time.
    pub fn name_format(mut self, format: impl Into<String>) -> Result<Self, ConcurrentError> {
        let format = format.into();
        validate_name_format(&format)?;
        self.name_format = Some(format);
        Ok(self)
    }

    pub fn stack_size(mut self, size: usize) -> Result<Self, ConcurrentError> {
        if size == 0 {
            return Err(ConcurrentError::ZeroStackSize);
        }
        self.stack_size = Some(size);
        Ok(self)
    }

    /// Installs a handler for tasks that panic. The panic does not propagate
    /// to the thread's `JoinHandle` once a handler is set.
    pub fn panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.panic_handler = Some(Arc::new(handler));
        self
    }

    /// Replaces the final `Builder::spawn` call, e.g. to track threads.
    pub fn spawner<F>(mut self, spawner: F) -> Self
    where
        F: Fn(thread::Builder, Task) -> io::Result<JoinHandle<()>> + Send + Sync + 'static,
    {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// The returned factory keeps its own counter; later changes to this
    /// builder do not affect it.
    pub fn build(&self) -> BuiltThreadFactory {
        BuiltThreadFactory {
            name_format: self.name_format.clone(),
            stack_size: self.stack_size,
            panic_handler: self.panic_handler.clone(),
            spawner: self.spawner.clone(),
            count: AtomicU64::new(0),
        }
    }
}

pub struct BuiltThreadFactory {
    name_format: Option<String>,
    stack_size: Option<usize>,
    panic_handler: Option<PanicHandler>,
    spawner: Option<Spawner>,
    count: AtomicU64,
}

impl ThreadFactory for BuiltThreadFactory {
    fn new_thread(&self, task: Task) -> io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new();
        let name = self
            .name_format
            .as_deref()
            .map(|format| format_name(format, self.count.fetch_add(1, Ordering::Relaxed)));
        if let Some(name) = &name {
            builder = builder.name(name.clone());
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let task: Task = match &self.panic_handler {
            Some(handler) => {
                let handler = handler.clone();
                Box::new(move || {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                        let current = thread::current();
                        handler(current.name().unwrap_or("<unnamed>"), &panic_message(&*payload));
                    }
                })
            }
            None => task,
        };

        debug!("spawning thread {:?}", name);
        match &self.spawner {
            Some(spawner) => spawner(builder, task),
            None => builder.spawn(task),
        }
    }
}

fn validate_name_format(format: &str) -> Result<(), ConcurrentError> {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let ok = match c {
            '{' => chars.next() == Some('}'),
            '}' | '\0' => false,
            _ => true,
        };
        if !ok {
            return Err(ConcurrentError::InvalidNameFormat(format.to_string()));
        }
    }
    Ok(())
}

fn format_name(format: &str, n: u64) -> String {
    format.replace("{}", &n.to_string())
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::sync::Mutex;

    fn current_name(factory: &dyn ThreadFactory) -> Option<String> {
        let (tx, rx) = mpsc::channel();
        factory
            .new_thread(Box::new(move || {
                tx.send(thread::current().name().map(str::to_string)).unwrap();
            }))
            .unwrap()
            .join()
            .unwrap();
        rx.recv().unwrap()
    }

    #[test]
    fn names_threads_with_a_counter() {
        let _ = env_logger::builder().is_test(true).try_init();
        let factory = ThreadFactoryBuilder::new()
            .name_format("pool-{}-thread")
            .unwrap()
            .build();
        assert_eq!(current_name(&factory).as_deref(), Some("pool-0-thread"));
        assert_eq!(current_name(&factory).as_deref(), Some("pool-1-thread"));
    }

    #[test]
    fn each_factory_has_its_own_counter() {
        let builder = ThreadFactoryBuilder::new().name_format("w{}").unwrap();
        let first = builder.build();
        let second = builder.build();
        assert_eq!(current_name(&first).as_deref(), Some("w0"));
        assert_eq!(current_name(&first).as_deref(), Some("w1"));
        assert_eq!(current_name(&second).as_deref(), Some("w0"));
    }

    #[test]
    fn fixed_name_without_placeholder() {
        let factory = ThreadFactoryBuilder::new()
            .name_format("singleton")
            .unwrap()
            .build();
        assert_eq!(current_name(&factory).as_deref(), Some("singleton"));
    }

    #[test]
    fn unnamed_by_default() {
        assert_eq!(current_name(&ThreadFactoryBuilder::new().build()), None);
        assert_eq!(current_name(&DefaultThreadFactory), None);
    }

    #[test]
    fn bad_formats_fail_fast() {
        for bad in ["{", "}", "a{b}", "{{}", "x{0}", "}{", "w\0{}"] {
            assert_eq!(
                ThreadFactoryBuilder::new().name_format(bad).err(),
                Some(ConcurrentError::InvalidNameFormat(bad.to_string())),
                "{}",
                bad
            );
        }
        assert_eq!(
            ThreadFactoryBuilder::new().stack_size(0).err(),
            Some(ConcurrentError::ZeroStackSize)
        );
    }

    #[test]
    fn panic_handler_sees_name_and_message() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let factory = ThreadFactoryBuilder::new()
            .name_format("crashy-{}")
            .unwrap()
            .stack_size(256 * 1024)
            .unwrap()
            .panic_handler(move |name, message| {
                sink.lock()
                    .unwrap()
                    .push((name.to_string(), message.to_string()));
            })
            .build();

        let handle = factory
            .new_thread(Box::new(|| panic!("bad input {}", 42)))
            .unwrap();
        assert!(handle.join().is_ok());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("crashy-0".to_string(), "bad input 42".to_string())]
        );
    }

    #[test]
    fn spawner_replaces_builder_spawn() {
        let spawned = Arc::new(AtomicUsize::new(0));
        let counter = spawned.clone();
        let factory = ThreadFactoryBuilder::new()
            .name_format("tracked-{}")
            .unwrap()
            .spawner(move |builder, task| {
                counter.fetch_add(1, Ordering::SeqCst);
                builder.spawn(task)
            })
            .build();

        assert_eq!(current_name(&factory).as_deref(), Some("tracked-0"));
        assert_eq!(current_name(&factory).as_deref(), Some("tracked-1"));
        assert_eq!(spawned.load(Ordering::SeqCst), 2);
    }
}
