use std::collections::HashMap;

use crate::container::Managed;
use crate::provider::{AnyHandle, Handle};
use crate::registry::{Registry, RegistryError};

/// Collects named providers for a [`Registry`]. Every duplicated name is
/// reported by [`RegistryBuilder::finish`], not only the first one.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    providers: HashMap<String, AnyHandle>,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Managed>(self, name: impl Into<String>, handle: &Handle<T>) -> Self {
        self.dyn_register(name, handle.erased().clone())
    }

    pub fn dyn_register(mut self, name: impl Into<String>, handle: AnyHandle) -> Self {
        let name = name.into();
        if self.providers.contains_key(&name) {
            self.errors.push(RegistryError::KeyDuplicated { name });
        } else {
            self.providers.insert(name, handle);
        }
        self
    }

    /// # Errors
    ///
    /// Returns the only error if a single name is duplicated, or
    /// [`RegistryError::Aggregated`] otherwise.
    pub fn finish(mut self) -> Result<Registry, RegistryError> {
        match self.errors.len() {
            0 => Ok(Registry {
                providers: self.providers,
            }),
            1 => Err(self.errors.remove(0)),
            _ => Err(RegistryError::Aggregated {
                errors: self.errors,
            }),
        }
    }
}
