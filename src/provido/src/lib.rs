#![allow(clippy::new_without_default)]

pub mod container;
pub mod must;
pub mod provider;
pub mod registry;
mod util;

pub use provido_derive::provider;

pub mod prelude {
    pub use crate::container::{CloseError, Concurrency, Container, Managed};
    pub use crate::provider;
    pub use crate::provider::{
        AnyHandle, BoxError, FactoryError, Handle, Identified, ProvideError, ProviderId,
        TypedProvider,
    };
    pub use crate::registry::{Registry, RegistryError};
    pub use crate::util::any::{Downcast, DowncastRef};
}
