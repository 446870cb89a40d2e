use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::provider::BoxError;
use crate::util::fmt::AggregatedDisplayer;

type HookFn = dyn Fn() -> Result<(), BoxError> + Send + Sync;

#[derive(Clone)]
pub(super) struct CloseHook {
    hook: Arc<HookFn>,
}

impl CloseHook {
    pub fn new<F, E>(hook: F) -> Self
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            hook: Arc::new(move || -> Result<(), BoxError> { hook().map_err(Into::into) }),
        }
    }

    pub fn call(&self) -> Result<(), BoxError> {
        (self.hook)()
    }
}

/// Every failure reported by close hooks during one [`Container::close`],
/// in registration order.
///
/// [`Container::close`]: crate::container::Container::close
#[derive(Debug, Snafu)]
#[snafu(display(
    "{} close hook(s) failed:\n{}",
    errors.len(),
    AggregatedDisplayer::new(errors.as_slice())
))]
pub struct CloseError {
    errors: Vec<BoxError>,
}

impl CloseError {
    pub(super) fn check(errors: Vec<BoxError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }

    /// Returns the first collected error of type `E`.
    pub fn find<E: Error + 'static>(&self) -> Option<&E> {
        self.errors.iter().find_map(|err| err.downcast_ref::<E>())
    }
}
