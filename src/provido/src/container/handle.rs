use std::any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::builder::ContainerBuilder;
use crate::container::close::{CloseError, CloseHook};
use crate::container::core::ContainerCore;
use crate::container::{Concurrency, Managed};
use crate::provider::{AnyHandle, BoxError, Handle, Identified, ProvideError};
use crate::util::any::Downcast;

/// A registry which lazily constructs objects and memoizes them per provider.
///
/// Objects are cached by provider identity. Concurrent requests for the same
/// provider wait for each other, while requests for different providers
/// never block each other, no matter how long a construction takes. A
/// factory may resolve its own dependencies through the container passed to
/// it.
///
/// Cloning a [`Container`] is cheap and every clone shares the same cache.
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    /// Creates a synchronized container.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a container which skips per-provider locking. See
    /// [`Concurrency::Unsynchronized`].
    pub fn unsynchronized() -> Self {
        Self::builder()
            .concurrency(Concurrency::Unsynchronized)
            .build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(super) fn from_core(core: Arc<ContainerCore>) -> Self {
        Self { core }
    }

    pub fn concurrency(&self) -> Concurrency {
        self.core.concurrency()
    }

    /// Returns the cached object of `handle`, constructing and caching it
    /// first on a miss.
    ///
    /// Requesting a provider from inside its own factory, directly or
    /// through other providers, deadlocks a synchronized container.
    ///
    /// # Errors
    ///
    /// Returns an error if the construction fails, in which case nothing is
    /// cached and a later request tries again.
    pub fn get<T: Managed>(&self, handle: &Handle<T>) -> Result<Arc<T>, ProvideError> {
        let object = self.dyn_get(handle.erased())?;
        object
            .downcast::<T>()
            .map_err(|_| ProvideError::TypeMismatch {
                provider: handle.id(),
                expected: any::type_name::<T>(),
            })
    }

    /// Always constructs a new object of `handle`, bypassing the cache.
    /// Dependencies the factory fetches through [`Container::get`] stay
    /// memoized.
    ///
    /// # Errors
    ///
    /// Returns an error if the construction fails, or
    /// [`ProvideError::TypeMismatch`] if the provider of `handle` doesn't
    /// construct a `T`.
    pub fn get_new<T: Managed>(&self, handle: &Handle<T>) -> Result<T, ProvideError> {
        let object = self.dyn_get_new(handle.erased())?;
        object
            .downcast::<T>()
            .map(|object| *object)
            .map_err(|_| ProvideError::TypeMismatch {
                provider: handle.id(),
                expected: any::type_name::<T>(),
            })
    }

    /// Installs `object` as the cached object of `handle` without running
    /// its factory, and returns the previously cached one.
    ///
    /// A previous object of another type, installed through
    /// [`Container::dyn_set_get`], is dropped and `None` is returned.
    pub fn set_get<T: Managed>(
        &self,
        handle: &Handle<T>,
        object: impl Into<Arc<T>>,
    ) -> Option<Arc<T>> {
        let object: Arc<T> = object.into();
        self.dyn_set_get(handle, object)
            .and_then(|old| old.downcast::<T>().ok())
    }

    /// Type-erased variant of [`Container::get`].
    ///
    /// # Errors
    ///
    /// Returns an error if the construction fails.
    pub fn dyn_get(&self, handle: &AnyHandle) -> Result<Arc<dyn Managed>, ProvideError> {
        self.core.get(handle, self)
    }

    /// Type-erased variant of [`Container::get_new`].
    ///
    /// # Errors
    ///
    /// Returns an error if the construction fails.
    pub fn dyn_get_new(&self, handle: &AnyHandle) -> Result<Box<dyn Managed>, ProvideError> {
        self.core.construct(handle, self)
    }

    /// Type-erased variant of [`Container::set_get`]. Nothing checks that
    /// `object` matches what the provider constructs; a later typed
    /// [`Container::get`] reports [`ProvideError::TypeMismatch`] if it
    /// doesn't.
    pub fn dyn_set_get<H>(
        &self,
        handle: &H,
        object: Arc<dyn Managed>,
    ) -> Option<Arc<dyn Managed>>
    where
        H: Identified + ?Sized,
    {
        self.core.replace(handle.provider_id(), object)
    }

    /// Drops the cached object of `handle`, so that the next
    /// [`Container::get`] constructs a new one.
    ///
    /// An in-flight construction for the same provider isn't awaited. It
    /// still caches its object when it finishes.
    pub fn flash<H>(&self, handle: &H)
    where
        H: Identified + ?Sized,
    {
        self.core.remove(handle.provider_id());
    }

    /// Returns whether an object of `handle` is cached right now. A
    /// concurrent construction may cache one right after this returns.
    pub fn has_cache<H>(&self, handle: &H) -> bool
    where
        H: Identified + ?Sized,
    {
        self.core.contains(handle.provider_id())
    }

    /// Registers a callback to run on [`Container::close`].
    ///
    /// The container owns its hooks, so a hook capturing a clone of the same
    /// container keeps the container alive until the process exits.
    pub fn on_close<F, E>(&self, hook: F)
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        self.core.push_close_hook(CloseHook::new(hook));
    }

    /// Runs every close hook in registration order, even if some fail.
    ///
    /// Closing neither clears the cache nor disables the container, and the
    /// hooks stay registered.
    ///
    /// # Errors
    ///
    /// Returns every hook failure aggregated in one [`CloseError`].
    pub fn close(&self) -> Result<(), CloseError> {
        self.core.close()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Container")
            .field("concurrency", &self.concurrency())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::error::Error;
    use std::fmt::Display;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Barrier};
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug)]
    struct TestObject {
        value: Mutex<i32>,
    }

    impl TestObject {
        fn new(value: i32) -> Self {
            Self {
                value: Mutex::new(value),
            }
        }

        fn get(&self) -> i32 {
            *self.value.lock()
        }
    }

    fn counted(calls: &Arc<AtomicUsize>) -> Handle<TestObject> {
        let calls = Arc::clone(calls);
        Handle::from_fn(move |_: &Container| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(TestObject::new(n as i32))
        })
    }

    /// Returns a provider whose first construction reports on `started` and
    /// then blocks until something is sent on `release`.
    fn gated(
        calls: &Arc<AtomicUsize>,
    ) -> (Handle<TestObject>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (started_tx, started) = mpsc::channel();
        let (release, released) = mpsc::channel();
        let gate = Mutex::new(Some((started_tx, released)));
        let calls = Arc::clone(calls);

        let handle = Handle::from_fn(move |_: &Container| -> Result<_, &'static str> {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let first = gate.lock().take();
            if let Some((started, released)) = first {
                started.send(()).map_err(|_| "start channel closed")?;
                released.recv().map_err(|_| "release channel closed")?;
            }
            Ok(TestObject::new(n as i32))
        });
        (handle, started, release)
    }

    fn finishes_promptly<R, F>(op: F) -> R
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (done, finished) = mpsc::channel();
        thread::spawn(move || {
            let _ = done.send(op());
        });
        finished
            .recv_timeout(Duration::from_secs(5))
            .expect("the operation should not wait for another construction")
    }

    #[derive(Debug)]
    struct DatabaseDown;

    impl Display for DatabaseDown {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "database is down")
        }
    }

    impl Error for DatabaseDown {}

    #[test]
    fn container_get_returns_the_same_object() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();

        let a = container.get(&handle).unwrap();
        let b = container.get(&handle).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_get_new_bypasses_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();

        for expected in 0..3 {
            assert_eq!(container.get_new(&handle).unwrap().get(), expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!container.has_cache(&handle));

        let cached = container.get(&handle).unwrap();
        container.get_new(&handle).unwrap();
        assert!(Arc::ptr_eq(&cached, &container.get(&handle).unwrap()));
    }

    #[test]
    fn container_flash_forces_reconstruction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();

        let before = container.get(&handle).unwrap();
        container.flash(&handle);
        assert!(!container.has_cache(&handle));

        let after = container.get(&handle).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.get(), 1);
        assert!(container.has_cache(&handle));
    }

    #[test]
    fn container_set_get_overrides_without_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();

        assert!(container.set_get(&handle, TestObject::new(42)).is_none());
        assert_eq!(container.get(&handle).unwrap().get(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let replacement = Arc::new(TestObject::new(7));
        let old = container.set_get(&handle, Arc::clone(&replacement)).unwrap();
        assert_eq!(old.get(), 42);
        assert!(Arc::ptr_eq(&container.get(&handle).unwrap(), &replacement));
    }

    #[test]
    fn container_get_retries_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = Handle::from_fn({
            let calls = Arc::clone(&calls);
            move |_: &Container| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("first attempt fails")
                } else {
                    Ok(TestObject::new(1))
                }
            }
        });
        let container = Container::new();

        let err = container.get(&handle).unwrap_err();
        assert_eq!(err.provider(), handle.id());
        assert_eq!(err.source().unwrap().to_string(), "first attempt fails");
        assert!(!container.has_cache(&handle));

        assert_eq!(container.get(&handle).unwrap().get(), 1);
        assert!(container.has_cache(&handle));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn container_get_passes_dependency_errors_through() {
        let config: Handle<TestObject> =
            Handle::from_fn(|_: &Container| Err::<TestObject, _>("missing config"));
        let client = Handle::from_fn({
            let config = config.clone();
            move |container: &Container| {
                let config = container.get(&config)?;
                Ok::<_, ProvideError>(config.get())
            }
        });
        let container = Container::new();

        let err = container.get(&client).unwrap_err();
        assert_eq!(err.provider(), config.id());
        assert!(!container.has_cache(&client));
    }

    #[test]
    fn container_get_fails_when_cached_object_has_another_type() {
        let handle = Handle::from_instance(1i32);
        let container = Container::new();

        assert!(container
            .dyn_set_get(&handle, Arc::new(String::from("not an i32")))
            .is_none());

        let err = container.get(&handle).unwrap_err();
        assert!(matches!(err, ProvideError::TypeMismatch { expected: "i32", .. }));
        assert!(container.set_get(&handle, 2i32).is_none());
        assert_eq!(*container.get(&handle).unwrap(), 2);
    }

    #[test]
    fn container_get_is_shared_between_clones() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();
        let cloned = container.clone();

        let a = container.get(&handle).unwrap();
        let b = cloned.get(&handle).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn container_caches_are_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let first = Container::new();
        let second = Container::new();

        let a = first.get(&handle).unwrap();
        let b = second.get(&handle).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn container_concurrent_get_constructs_once() {
        const THREADS: usize = 32;
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let container = container.clone();
                let handle = handle.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    container.get(&handle).unwrap()
                })
            })
            .collect();

        let objects: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("Each thread should not `panic!()`"))
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(objects.iter().all(|obj| Arc::ptr_eq(obj, &objects[0])));
    }

    #[test]
    fn container_slow_provider_does_not_block_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (slow, started, release) = gated(&calls);
        let fast = Handle::from_instance(5u8);
        let container = Container::new();

        let blocked = thread::spawn({
            let container = container.clone();
            let slow = slow.clone();
            move || container.get(&slow).map(|obj| obj.get())
        });
        started.recv().unwrap();

        let fast = finishes_promptly({
            let container = container.clone();
            move || container.get(&fast)
        });
        assert_eq!(*fast.unwrap(), 5);
        assert!(!container.has_cache(&slow));

        release.send(()).unwrap();
        assert_eq!(blocked.join().unwrap().unwrap(), 0);
        assert!(container.has_cache(&slow));
    }

    #[test]
    fn container_flash_does_not_wait_for_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (slow, started, release) = gated(&calls);
        let container = Container::new();

        let blocked = thread::spawn({
            let container = container.clone();
            let slow = slow.clone();
            move || container.get(&slow)
        });
        started.recv().unwrap();

        finishes_promptly({
            let container = container.clone();
            let slow = slow.clone();
            move || container.flash(&slow)
        });
        assert!(!container.has_cache(&slow));

        release.send(()).unwrap();
        let constructed = blocked.join().unwrap().unwrap();
        assert!(container.has_cache(&slow));
        assert!(Arc::ptr_eq(&constructed, &container.get(&slow).unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_set_get_races_construction_with_last_write_winning() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (slow, started, release) = gated(&calls);
        let container = Container::new();

        let blocked = thread::spawn({
            let container = container.clone();
            let slow = slow.clone();
            move || container.get(&slow)
        });
        started.recv().unwrap();

        let old = finishes_promptly({
            let container = container.clone();
            let slow = slow.clone();
            move || container.set_get(&slow, TestObject::new(7))
        });
        assert!(old.is_none());
        assert!(container.has_cache(&slow));

        release.send(()).unwrap();
        let constructed = blocked.join().unwrap().unwrap();
        assert_eq!(constructed.get(), 0);

        let cached = container.get(&slow).unwrap();
        assert!(Arc::ptr_eq(&constructed, &cached));
    }

    #[test]
    fn container_get_new_does_not_wait_for_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (slow, started, release) = gated(&calls);
        let container = Container::new();

        let blocked = thread::spawn({
            let container = container.clone();
            let slow = slow.clone();
            move || container.get(&slow)
        });
        started.recv().unwrap();

        let fresh = finishes_promptly({
            let container = container.clone();
            let slow = slow.clone();
            move || container.get_new(&slow)
        });
        assert_eq!(fresh.unwrap().get(), 1);
        assert!(!container.has_cache(&slow));

        release.send(()).unwrap();
        assert_eq!(blocked.join().unwrap().unwrap().get(), 0);
        assert_eq!(container.get(&slow).unwrap().get(), 0);
    }

    #[test]
    fn container_get_keeps_the_factory_error() {
        let handle = Handle::from_fn(|_: &Container| Err::<u8, _>(DatabaseDown));
        let container = Container::new();

        let err = container.get(&handle).unwrap_err();
        let source = err.source().expect("a construction error should have a source");
        assert!(source.downcast_ref::<DatabaseDown>().is_some());

        let ProvideError::Construction { source, .. } = &err else {
            panic!("expected a construction error");
        };
        assert!(source.get().is::<DatabaseDown>());
        assert_eq!(source.to_string(), "database is down");
    }

    #[test]
    fn container_unsynchronized_still_memoizes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::unsynchronized();

        let a = container.get(&handle).unwrap();
        let b = container.get(&handle).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(container.concurrency(), Concurrency::Unsynchronized);
    }

    #[test]
    fn container_close_aggregates_failures() {
        let container = Container::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 1..=3 {
            let order = Arc::clone(&order);
            container.on_close(move || {
                order.lock().push(i);
                if i == 2 {
                    Err(format!("hook {i} failed"))
                } else {
                    Ok(())
                }
            });
        }

        let err = container.close().unwrap_err();
        assert_eq!(*order.lock(), vec![1, 2, 3]);
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].to_string(), "hook 2 failed");
    }

    #[test]
    fn container_close_keeps_cache_and_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counted(&calls);
        let container = Container::new();
        let closed = Arc::new(AtomicUsize::new(0));

        container.on_close({
            let closed = Arc::clone(&closed);
            let container = container.clone();
            let handle = handle.clone();
            move || {
                closed.fetch_add(1, Ordering::SeqCst);
                container.get(&handle).map(|_| ())
            }
        });

        let before = container.get(&handle).unwrap();
        assert!(container.close().is_ok());
        assert!(container.close().is_ok());

        assert_eq!(closed.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&before, &container.get(&handle).unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_hook_holding_the_container_keeps_it_alive() {
        let container = Container::new();
        assert_eq!(Arc::strong_count(&container.core), 1);

        container.on_close({
            let container = container.clone();
            move || {
                let _ = container.concurrency();
                Ok::<_, Infallible>(())
            }
        });
        assert_eq!(Arc::strong_count(&container.core), 2);
    }

    #[test]
    fn container_close_succeeds_without_hooks() {
        assert!(Container::new().close().is_ok());
    }
}
