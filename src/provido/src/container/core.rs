use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, debug_span, trace};

use crate::container::close::{CloseError, CloseHook};
use crate::container::{Concurrency, Container, Managed};
use crate::provider::{AnyHandle, BoxError, ProvideError, ProviderId};

pub struct ContainerCore {
    concurrency: Concurrency,
    structure: RwLock<StructuralData>,
}

impl ContainerCore {
    pub fn new(concurrency: Concurrency, capacity: usize) -> Self {
        Self {
            concurrency,
            structure: RwLock::new(StructuralData::with_capacity(capacity)),
        }
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    pub fn get(
        &self,
        handle: &AnyHandle,
        container: &Container,
    ) -> Result<Arc<dyn Managed>, ProvideError> {
        let id = handle.id();
        let lock = self.provider_lock(id);
        let _guard = lock.as_deref().map(|lock| lock.lock());

        if let Some(object) = self.cached(id) {
            trace!(provider = %id, "found cached object");
            return Ok(object);
        }

        let object: Arc<dyn Managed> = Arc::from(self.construct(handle, container)?);
        self.structure
            .write()
            .instances
            .insert(id, Arc::clone(&object));
        debug!(provider = %id, "cached constructed object");
        Ok(object)
    }

    pub fn construct(
        &self,
        handle: &AnyHandle,
        container: &Container,
    ) -> Result<Box<dyn Managed>, ProvideError> {
        let id = handle.id();
        let _span = debug_span!("construct", provider = %id, output = handle.output()).entered();

        handle.provider().dyn_provide(container).map_err(|err| {
            debug!("construction failed");
            ProvideError::from_factory(id, err)
        })
    }

    pub fn replace(&self, id: ProviderId, object: Arc<dyn Managed>) -> Option<Arc<dyn Managed>> {
        let old = self.structure.write().instances.insert(id, object);
        debug!(provider = %id, replaced = old.is_some(), "installed object");
        old
    }

    pub fn remove(&self, id: ProviderId) {
        let old = self.structure.write().instances.remove(&id);
        debug!(provider = %id, removed = old.is_some(), "flashed cache");
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.structure.read().instances.contains_key(&id)
    }

    pub fn push_close_hook(&self, hook: CloseHook) {
        self.structure.write().close_hooks.push(hook);
    }

    pub fn close(&self) -> Result<(), CloseError> {
        // Hooks run outside the structural lock since they may use the
        // container themselves.
        let hooks = self.structure.read().close_hooks.clone();

        let errors: Vec<BoxError> = hooks.iter().filter_map(|hook| hook.call().err()).collect();
        debug!(hooks = hooks.len(), failed = errors.len(), "ran close hooks");

        CloseError::check(errors)
    }

    fn cached(&self, id: ProviderId) -> Option<Arc<dyn Managed>> {
        self.structure.read().instances.get(&id).cloned()
    }

    fn provider_lock(&self, id: ProviderId) -> Option<Arc<Mutex<()>>> {
        if self.concurrency == Concurrency::Unsynchronized {
            return None;
        }

        if let Some(lock) = self.structure.read().locks.get(&id) {
            return Some(Arc::clone(lock));
        }

        let mut structure = self.structure.write();
        let lock = structure.locks.entry(id).or_default();
        Some(Arc::clone(lock))
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.structure.read().locks.len()
    }
}

struct StructuralData {
    instances: HashMap<ProviderId, Arc<dyn Managed>>,
    locks: HashMap<ProviderId, Arc<Mutex<()>>>,
    close_hooks: Vec<CloseHook>,
}

impl StructuralData {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: HashMap::with_capacity(capacity),
            locks: HashMap::with_capacity(capacity),
            close_hooks: Vec::new(),
        }
    }
}
