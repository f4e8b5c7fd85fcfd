//! Process-wide handle registry and the base every SDK object embeds.
//!
//! Every SDK-visible entity is published here under an opaque numeric
//! handle so callers on any thread can resolve it. The registry holds weak
//! references only: ownership lives in the [`ObjRef`](crate::ObjRef) smart
//! handles, and an object's entry is removed exactly once, when its last
//! strong reference drops.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use downcast_rs::{DowncastSync, impl_downcast};
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Opaque numeric identifier standing in for a direct reference to an
/// object. Unique while the object is live and never reused afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// Reserved value that never resolves to an object.
    pub const INVALID: Handle = Handle(0);

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// Handles are allocated from a monotonic counter: a u64 cannot wrap within
// the life of a process, so a live handle is never reissued.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0xFACE);

fn next_handle() -> Handle {
    Handle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
}

/// Closed set of object kinds the registry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Server,
    Vm,
    Job,
    Question,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Server => "server",
            ObjectKind::Vm => "vm",
            ObjectKind::Job => "job",
            ObjectKind::Question => "question",
        };
        f.write_str(name)
    }
}

/// Private module for the sealed trait pattern.
pub mod private {
    /// Marker trait that seals `SdkObject`.
    pub trait Sealed {}
}

/// Capability every SDK-visible entity implements.
pub trait SdkObject: private::Sealed + DowncastSync {
    /// Opaque handle this object is published under.
    fn handle(&self) -> Handle;

    /// Type tag used for checked casts at lookup time.
    fn kind(&self) -> ObjectKind;

    /// Serializes the wrapped configuration document, if the object has
    /// one. Forwarded opaquely; the runtime never inspects the text.
    fn to_text(&self) -> Result<String> {
        Err(Error::Unimplemented)
    }

    /// Replaces the wrapped configuration document from its text form.
    fn from_text(&self, _text: &str) -> Result<()> {
        Err(Error::Unimplemented)
    }
}

impl_downcast!(sync SdkObject);

/// Statically-known kind for concrete SDK object types, enabling typed
/// lookups that fail closed instead of trusting the caller.
pub trait TypedObject: SdkObject {
    const KIND: ObjectKind;
}

/// Embeddable base for SDK objects.
///
/// Allocates the handle at construction; evicts the registry entry when the
/// owning object is destroyed, which happens synchronously with the last
/// strong reference going away.
pub struct ObjectBase {
    handle: Handle,
    kind: ObjectKind,
}

impl ObjectBase {
    pub fn new(kind: ObjectKind) -> Self {
        let base = Self {
            handle: next_handle(),
            kind,
        };
        tracing::debug!(handle = %base.handle, kind = %base.kind, "object created");
        base
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
}

impl Drop for ObjectBase {
    fn drop(&mut self) {
        registry().evict(self.handle);
        tracing::debug!(handle = %self.handle, kind = %self.kind, "object destroyed");
    }
}

/// Process-wide map from handle to object, guarded by one mutex.
///
/// The lock is held only for the duration of a single map operation; the
/// strong reference a lookup returns is taken under the lock, so a
/// concurrent release elsewhere cannot free the object between lookup and
/// use.
pub struct HandleRegistry {
    entries: Mutex<HashMap<Handle, Weak<dyn SdkObject>>>,
}

static REGISTRY: LazyLock<HandleRegistry> = LazyLock::new(|| HandleRegistry {
    entries: Mutex::new(HashMap::new()),
});

/// The process-wide registry every handle resolves through.
pub fn registry() -> &'static HandleRegistry {
    &REGISTRY
}

impl HandleRegistry {
    /// Publishes an object under its own handle.
    ///
    /// Handles are allocated once and never reused, so at most one object
    /// is ever registered per handle.
    pub fn publish<T: SdkObject>(&self, object: &Arc<T>) -> Handle {
        let handle = object.handle();
        let object: Arc<dyn SdkObject> = object.clone();
        let weak: Weak<dyn SdkObject> = Arc::downgrade(&object);
        if self.entries.lock().insert(handle, weak).is_some() {
            // Handles are never reissued; a collision means a broken factory.
            tracing::warn!(%handle, "publish replaced an existing registry entry");
        }
        handle
    }

    /// Resolves a handle to a strong reference.
    ///
    /// An unknown handle, or one whose object is mid-destruction, reports
    /// as invalid; it is an expected caller error, never a panic.
    pub fn lookup(&self, handle: Handle) -> Result<Arc<dyn SdkObject>> {
        self.entries
            .lock()
            .get(&handle)
            .and_then(Weak::upgrade)
            .ok_or(Error::InvalidHandle {
                handle,
                expected: None,
            })
    }

    /// Resolves a handle and checks the type tag, failing closed on a
    /// mismatch.
    pub fn lookup_as<T: TypedObject>(&self, handle: Handle) -> Result<Arc<T>> {
        let invalid = || Error::InvalidHandle {
            handle,
            expected: Some(T::KIND),
        };
        let object = self.lookup(handle).map_err(|_| invalid())?;
        if object.kind() != T::KIND {
            return Err(invalid());
        }
        object.downcast_arc::<T>().map_err(|_| invalid())
    }

    /// Removes an entry. Called exactly once per object, from
    /// [`ObjectBase::drop`].
    pub(crate) fn evict(&self, handle: Handle) {
        self.entries.lock().remove(&handle);
    }
}
