use std::sync::Arc;

use crate::container::core::ContainerCore;
use crate::container::{Concurrency, Container};

const DEFAULT_CAPACITY: usize = 10;

/// Configures a [`Container`] before creating it.
///
/// # Examples
///
/// ```rust
/// # use provido::container::{Concurrency, Container};
/// let container = Container::builder()
///     .concurrency(Concurrency::Unsynchronized)
///     .capacity(64)
///     .build();
/// assert_eq!(container.concurrency(), Concurrency::Unsynchronized);
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    concurrency: Concurrency,
    capacity: usize,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            concurrency: Concurrency::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn concurrency(self, concurrency: Concurrency) -> Self {
        Self {
            concurrency,
            ..self
        }
    }

    /// Pre-sizes the object cache and the lock table for `capacity`
    /// providers.
    pub fn capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    pub fn build(self) -> Container {
        Container::from_core(Arc::new(ContainerCore::new(
            self.concurrency,
            self.capacity,
        )))
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
