//! Name-based access to providers.
//!
//! A [`Registry`] maps string names to providers, for callers which only know
//! a service by name, e.g. from a configuration file. Every operation
//! resolves the name first and then delegates to the [`Container`].

mod builder;

use std::any;
use std::collections::HashMap;
use std::sync::Arc;

use snafu::prelude::*;

use crate::container::{Container, Managed};
use crate::provider::{AnyHandle, ProvideError};
use crate::util::any::Downcast;
use crate::util::fmt::AggregatedDisplayer;

pub use builder::RegistryBuilder;

#[derive(Debug, Clone)]
pub struct Registry {
    providers: HashMap<String, AnyHandle>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Returns the handle registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if `name` is unknown.
    pub fn handle(&self, name: &str) -> Result<&AnyHandle, RegistryError> {
        self.providers.get(name).context(NotRegisteredSnafu { name })
    }

    /// Name-based [`Container::dyn_get`].
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is unknown or the construction fails.
    pub fn get(&self, container: &Container, name: &str) -> Result<Arc<dyn Managed>, RegistryError> {
        let handle = self.handle(name)?;
        container.dyn_get(handle).context(ProvideSnafu)
    }

    /// Name-based [`Container::get`].
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is unknown, the construction fails, or the
    /// object isn't a `T`.
    pub fn get_as<T: Managed>(&self, container: &Container, name: &str) -> Result<Arc<T>, RegistryError> {
        self.get(container, name)?
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
                expected: any::type_name::<T>(),
            })
    }

    /// Name-based [`Container::dyn_get_new`].
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is unknown or the construction fails.
    pub fn get_new(&self, container: &Container, name: &str) -> Result<Box<dyn Managed>, RegistryError> {
        let handle = self.handle(name)?;
        container.dyn_get_new(handle).context(ProvideSnafu)
    }

    /// Name-based [`Container::dyn_set_get`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if `name` is unknown.
    pub fn set_cache(
        &self,
        container: &Container,
        name: &str,
        object: Arc<dyn Managed>,
    ) -> Result<Option<Arc<dyn Managed>>, RegistryError> {
        let handle = self.handle(name)?;
        Ok(container.dyn_set_get(handle, object))
    }

    /// Name-based [`Container::has_cache`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if `name` is unknown.
    pub fn has_cache(&self, container: &Container, name: &str) -> Result<bool, RegistryError> {
        let handle = self.handle(name)?;
        Ok(container.has_cache(handle))
    }

    /// Name-based [`Container::flash`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if `name` is unknown.
    pub fn flash_cache(&self, container: &Container, name: &str) -> Result<(), RegistryError> {
        let handle = self.handle(name)?;
        container.flash(handle);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RegistryError {
    #[snafu(display("no provider is registered as {name:?}"))]
    #[non_exhaustive]
    NotRegistered { name: String },
    #[snafu(display("a provider is already registered as {name:?}"))]
    #[non_exhaustive]
    KeyDuplicated { name: String },
    #[snafu(display("the object registered as {name:?} is not a {expected}"))]
    #[non_exhaustive]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
    #[snafu(display("could not provide the requested object"))]
    #[non_exhaustive]
    Provide { source: ProvideError },
    #[snafu(display("aggregated registry errors:\n{}", AggregatedDisplayer::new(errors.as_slice())))]
    Aggregated { errors: Vec<RegistryError> },
}
