use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use crate::container::{Container, Managed};
use crate::provider::{BoxError, TypedProvider};

/// A [`Provider`] which constructs objects by calling a closure with the
/// resolving container.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use provido::container::Container;
/// # use provido::provider::closure::FnProvider;
/// let provider = FnProvider::new(|_: &Container| Ok::<_, Infallible>(String::from("hi")));
/// ```
///
/// [`Provider`]: crate::provider::Provider
pub struct FnProvider<T, F, E>
where
    T: Managed,
    F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    factory: F,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, F, E> FnProvider<T, F, E>
where
    T: Managed,
    F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: PhantomData,
        }
    }
}

impl<T, F, E> Debug for FnProvider<T, F, E>
where
    T: Managed,
    F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FnProvider<T, F, E>")
            .finish_non_exhaustive()
    }
}

impl<T, F, E> TypedProvider for FnProvider<T, F, E>
where
    T: Managed,
    F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    type Output = T;

    type Error = E;

    fn provide(&self, container: &Container) -> Result<Self::Output, Self::Error> {
        (self.factory)(container)
    }
}
