use std::convert::Infallible;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::{Container, Managed};
use crate::provider::TypedProvider;

/// A provider which hands out a clone of a fixed value.
pub struct InstanceProvider<T>
where
    T: Managed + Clone,
{
    instance: T,
}

impl<T> InstanceProvider<T>
where
    T: Managed + Clone,
{
    pub fn new(instance: T) -> Self {
        Self { instance }
    }
}

impl<T> Debug for InstanceProvider<T>
where
    T: Managed + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstanceProvider<T>")
            .finish_non_exhaustive()
    }
}

impl<T> TypedProvider for InstanceProvider<T>
where
    T: Managed + Clone,
{
    type Output = T;

    type Error = Infallible;

    fn provide(&self, _container: &Container) -> Result<Self::Output, Self::Error> {
        Ok(self.instance.clone())
    }
}
