//! Panicking shorthands for programs which treat a failed construction as
//! fatal, typically during startup.

use std::sync::Arc;

use crate::container::{Container, Managed};
use crate::provider::Handle;

pub trait MustExt {
    /// Like [`Container::get`], but panics on failure.
    fn must_get<T: Managed>(&self, handle: &Handle<T>) -> Arc<T>;

    /// Like [`Container::get_new`], but panics on failure.
    fn must_get_new<T: Managed>(&self, handle: &Handle<T>) -> T;

    /// Like [`Container::close`], but panics if any hook fails.
    fn must_close(&self);
}

impl MustExt for Container {
    fn must_get<T: Managed>(&self, handle: &Handle<T>) -> Arc<T> {
        self.get(handle)
            .unwrap_or_else(|err| panic!("could not get {}: {err}", handle.erased().output()))
    }

    fn must_get_new<T: Managed>(&self, handle: &Handle<T>) -> T {
        self.get_new(handle)
            .unwrap_or_else(|err| panic!("could not construct {}: {err}", handle.erased().output()))
    }

    fn must_close(&self) {
        if let Err(err) = self.close() {
            panic!("could not close the container: {err}");
        }
    }
}
