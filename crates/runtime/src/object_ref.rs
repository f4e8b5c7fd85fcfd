//! Typed smart handle used at call sites instead of touching the registry
//! directly.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::Result;
use crate::registry::{Handle, SdkObject, TypedObject, registry};

/// Owning, typed reference to a published SDK object.
///
/// Cloning takes another strong reference; dropping releases it. When the
/// last `ObjRef` to an object goes away, the object is destroyed and its
/// handle stops resolving. Assignment cannot produce a transient zero: the
/// new reference is held before the old one is released, so aliasing and
/// self-assignment are safe.
pub struct ObjRef<T: SdkObject> {
    inner: Arc<T>,
}

impl<T: SdkObject> ObjRef<T> {
    /// Wraps an already-held strong reference.
    pub fn new(inner: Arc<T>) -> Self {
        Self { inner }
    }

    /// Publishes a freshly constructed object and returns the first
    /// reference to it. Publication is all-or-nothing: the object is either
    /// resolvable and owned, or was never registered.
    pub fn publish(value: T) -> Self {
        let inner = Arc::new(value);
        registry().publish(&inner);
        Self { inner }
    }

    pub fn handle(&self) -> Handle {
        self.inner.handle()
    }

    /// Extracts the underlying shared pointer.
    pub fn into_arc(self) -> Arc<T> {
        self.inner
    }

    pub fn as_arc(&self) -> &Arc<T> {
        &self.inner
    }

    /// Type-erases to the base object capability.
    pub fn erase(&self) -> Arc<dyn SdkObject> {
        self.inner.clone()
    }
}

impl<T: TypedObject> ObjRef<T> {
    /// Resolves a raw handle, failing closed on an unknown handle or a kind
    /// mismatch.
    pub fn from_handle(handle: Handle) -> Result<Self> {
        registry().lookup_as::<T>(handle).map(Self::new)
    }
}

impl<T: SdkObject> Clone for ObjRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SdkObject> Deref for ObjRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: SdkObject> fmt::Debug for ObjRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjRef")
            .field("handle", &self.handle())
            .field("kind", &self.inner.kind())
            .finish()
    }
}
