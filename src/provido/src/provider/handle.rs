use std::any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::{Container, Managed};
use crate::provider::closure::FnProvider;
use crate::provider::instance::InstanceProvider;
use crate::provider::{BoxError, Identified, ProvideError, Provider, ProviderId, TypedProvider};

/// A type-erased, shareable reference to a provider and its identity.
///
/// Clones refer to the same provider and share its cache entry in every
/// container. Equality and hashing follow the identity only.
#[derive(Clone)]
pub struct AnyHandle {
    id: ProviderId,
    output: &'static str,
    provider: Arc<dyn Provider>,
}

impl AnyHandle {
    /// Wraps a [`Provider`] with a fresh identity.
    pub fn new<P: Provider>(provider: P) -> Self {
        Self::with_output(Arc::new(provider), any::type_name::<P>())
    }

    fn with_output(provider: Arc<dyn Provider>, output: &'static str) -> Self {
        Self {
            id: ProviderId::next(),
            output,
            provider,
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// A human readable name of what the provider constructs, used in
    /// diagnostics.
    pub fn output(&self) -> &'static str {
        self.output
    }

    pub(crate) fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }
}

impl Identified for AnyHandle {
    fn provider_id(&self) -> ProviderId {
        self.id
    }
}

impl Debug for AnyHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnyHandle")
            .field("id", &self.id)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl PartialEq for AnyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnyHandle {}

impl Hash for AnyHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A typed handle to a provider constructing `T`.
///
/// A [`Handle`] is what callers pass to a [`Container`]. It's typically kept
/// in a `static` or owned by a service struct, so that every request names
/// the same identity.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use provido::container::Container;
/// # use provido::provider::Handle;
/// let answer = Handle::from_fn(|_: &Container| Ok::<_, Infallible>(42u32));
/// let container = Container::new();
///
/// assert_eq!(*answer.get(&container).unwrap(), 42);
/// assert!(container.has_cache(&answer));
/// ```
pub struct Handle<T: Managed> {
    inner: AnyHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Managed> Handle<T> {
    /// Wraps a [`TypedProvider`] with a fresh identity.
    pub fn new<P>(provider: P) -> Self
    where
        P: TypedProvider<Output = T>,
    {
        Self {
            inner: AnyHandle::with_output(Arc::new(provider), any::type_name::<T>()),
            _marker: PhantomData,
        }
    }

    /// Creates a handle whose provider runs `factory` on each construction.
    pub fn from_fn<F, E>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::new(FnProvider::new(factory))
    }

    /// Creates a handle whose provider hands out clones of `instance`.
    pub fn from_instance(instance: T) -> Self
    where
        T: Clone,
    {
        Self::new(InstanceProvider::new(instance))
    }

    pub fn id(&self) -> ProviderId {
        self.inner.id
    }

    pub fn erased(&self) -> &AnyHandle {
        &self.inner
    }

    pub fn into_erased(self) -> AnyHandle {
        self.inner
    }

    /// Shorthand for [`Container::get`].
    ///
    /// # Errors
    ///
    /// Returns an error if the object has to be constructed and the
    /// construction fails.
    pub fn get(&self, container: &Container) -> Result<Arc<T>, ProvideError> {
        container.get(self)
    }

    /// Shorthand for [`Container::get_new`].
    ///
    /// # Errors
    ///
    /// Returns an error if the construction fails.
    pub fn get_new(&self, container: &Container) -> Result<T, ProvideError> {
        container.get_new(self)
    }
}

impl<T: Managed> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Managed> Identified for Handle<T> {
    fn provider_id(&self) -> ProviderId {
        self.inner.id
    }
}

impl<T: Managed> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Handle")
            .field("id", &self.inner.id)
            .field("output", &self.inner.output)
            .finish_non_exhaustive()
    }
}

impl<T: Managed> From<Handle<T>> for AnyHandle {
    fn from(handle: Handle<T>) -> Self {
        handle.inner
    }
}
