pub mod closure;
pub mod instance;

mod handle;
mod id;

use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::ops::Deref;
use std::sync::Arc;

use snafu::prelude::*;

use crate::container::{Container, Managed};

pub use handle::{AnyHandle, Handle};
pub use id::{Identified, ProviderId};

/// The error type factories and close hooks report.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A type-erased factory which constructs objects of one type.
///
/// A [`Provider`] receives the [`Container`] resolving it, so it may fetch
/// its own dependencies through [`Container::get`] or
/// [`Container::get_new`]. Fetching itself through [`Container::get`],
/// directly or through other providers, deadlocks a synchronized container.
///
/// Usually you don't need to implement [`Provider`] manually, since this is
/// automatically done by [`TypedProvider`]'s blanket implementation.
#[cfg_attr(test, mockall::automock)]
pub trait Provider: Send + Sync + 'static {
    /// Provides a newly created type-erased object.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be fetched or the object
    /// construction fails.
    fn dyn_provide(&self, container: &Container) -> Result<Box<dyn Managed>, BoxError>;
}

/// A static variant of the [`Provider`] trait, leveraging static dispatch and
/// type-safety.
pub trait TypedProvider: Send + Sync + 'static {
    /// The object constructed on each request.
    type Output: Managed;

    /// The error occurred in object construction.
    type Error: Into<BoxError>;

    /// Provides a newly created object of type [`TypedProvider::Output`].
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be fetched or the object
    /// construction fails.
    fn provide(&self, container: &Container) -> Result<Self::Output, Self::Error>;
}

impl<T: TypedProvider> Provider for T {
    fn dyn_provide(&self, container: &Container) -> Result<Box<dyn Managed>, BoxError> {
        self.provide(container)
            .map(|obj| -> Box<dyn Managed> { Box::new(obj) })
            .map_err(Into::into)
    }
}

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum ProvideError {
    #[snafu(display("{provider} could not construct its object"))]
    #[non_exhaustive]
    Construction {
        provider: ProviderId,
        source: FactoryError,
    },
    #[snafu(display("{provider} holds an object which is not a {expected}"))]
    #[non_exhaustive]
    TypeMismatch {
        provider: ProviderId,
        expected: &'static str,
    },
}

impl ProvideError {
    /// Turns a factory failure into a [`ProvideError`]. A [`ProvideError`]
    /// returned by the factory comes from one of its dependencies and is kept
    /// as is, so callers see the provider which actually failed.
    pub(crate) fn from_factory(provider: ProviderId, err: BoxError) -> Self {
        match err.downcast::<ProvideError>() {
            Ok(err) => *err,
            Err(err) => Self::Construction {
                provider,
                source: FactoryError(Arc::from(err)),
            },
        }
    }

    /// Returns the provider this error is about.
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Construction { provider, .. } => *provider,
            Self::TypeMismatch { provider, .. } => *provider,
        }
    }
}

/// A factory's own failure, shared so that [`ProvideError`] stays cheap to
/// clone.
///
/// It dereferences to the error the factory returned, which is also what
/// [`ProvideError::source`](Error::source) yields, so the original error can
/// be downcast. It doesn't implement [`Error`] itself since that would put
/// it in the source chain instead.
#[derive(Clone)]
pub struct FactoryError(Arc<dyn Error + Send + Sync>);

impl FactoryError {
    pub fn get(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl Deref for FactoryError {
    type Target = dyn Error + Send + Sync + 'static;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl Debug for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&*self.0, f)
    }
}
