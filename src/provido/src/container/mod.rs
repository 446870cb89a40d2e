mod builder;
mod close;
mod core;
mod handle;

use crate::util::any::AsAny;

pub use builder::ContainerBuilder;
pub use close::CloseError;
pub use handle::Container;

/// Objects a [`Container`] can construct and cache.
pub trait Managed: AsAny {}

impl<T> Managed for T where T: AsAny {}

/// How a [`Container`] guards provider construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Concurrency {
    /// Concurrent requests for the same provider serialize on a lock
    /// dedicated to that provider, so its factory runs at most once.
    #[default]
    Synchronized,
    /// No per-provider lock is taken. Only valid when the container is
    /// confined to one thread; otherwise a factory may run more than once
    /// and the last constructed object wins.
    Unsynchronized,
}
