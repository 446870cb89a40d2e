use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// The identity of a provider, used as its cache key.
///
/// A fresh [`ProviderId`] is allocated each time a provider is wrapped into
/// a [`Handle`] or an [`AnyHandle`], so two handles built from identical
/// factories are still distinct cache entries. Cloning a handle keeps its
/// identity.
///
/// [`Handle`]: crate::provider::Handle
/// [`AnyHandle`]: crate::provider::AnyHandle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId(u64);

impl ProviderId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "provider#{}", self.0)
    }
}

/// Anything that names a provider identity.
pub trait Identified {
    fn provider_id(&self) -> ProviderId;
}

impl Identified for ProviderId {
    fn provider_id(&self) -> ProviderId {
        *self
    }
}
