//! Mountable content handles and the allocators that create them.

use crate::host::Host;
use crate::pool::{ContentPool, DefaultContentPool, PoolKey};
use rendercore_graphics::{EdgeInsets, Rect};
use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of content objects a pool keeps unless the allocator says otherwise.
pub const DEFAULT_POOL_SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderType {
    /// Content that can hold children and receive input.
    View,
    /// Draw-only content. It never hosts other content.
    Drawable,
}

/// Native content the mount engine positions but never inspects.
///
/// Content is confined to the thread that mounts it, so implementations use
/// interior mutability for the setters below.
pub trait MountContent: Any {
    /// Returns the host view of this content when it can hold children.
    fn as_host(&self) -> Option<&dyn Host> {
        None
    }

    /// Applies bounds relative to the host this content is mounted in.
    fn set_bounds(&self, _bounds: Rect) {}

    fn set_padding(&self, _padding: EdgeInsets) {}
}

/// Shared handle to a piece of mounted content.
///
/// Equality is identity: two handles are the same content only if they
/// point at the same object.
#[derive(Clone)]
pub struct Content {
    inner: Rc<dyn MountContent>,
    type_name: &'static str,
}

impl Content {
    pub fn new<T: MountContent>(content: T) -> Self {
        Self {
            inner: Rc::new(content),
            type_name: type_name::<T>(),
        }
    }

    pub fn from_rc<T: MountContent>(content: Rc<T>) -> Self {
        Self {
            inner: content,
            type_name: type_name::<T>(),
        }
    }

    pub fn ptr_eq(&self, other: &Content) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let any: &dyn Any = &*self.inner;
        any.downcast_ref::<T>()
    }

    pub fn as_host(&self) -> Option<&dyn Host> {
        self.inner.as_host()
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.inner.set_bounds(bounds);
    }

    pub fn set_padding(&self, padding: EdgeInsets) {
        self.inner.set_padding(padding);
    }

    /// Address of the underlying object, stable while the content lives.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Content {}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Content({}@{:#x})", self.type_name, self.addr())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u64);

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Lifetime scope of content, such as one window.
///
/// Pools are keyed by scope so content created for one window is never
/// handed to another, and everything pooled for a scope can be dropped
/// when it goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextScope {
    id: ScopeId,
    name: &'static str,
}

impl ContextScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            id: ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)),
            name,
        }
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Creates content for a render unit and describes how it may be pooled.
///
/// Allocators are shared by render units that are built off the UI thread,
/// hence `Send + Sync`; the content they produce is not.
pub trait ContentAllocator: Send + Sync + 'static {
    fn create_content(&self, scope: &ContextScope) -> Content;

    fn render_type(&self) -> RenderType;

    /// Key of the pool this allocator's content is recycled through.
    fn pool_key(&self) -> PoolKey {
        PoolKey::of::<Self>()
    }

    fn create_pool(&self) -> Box<dyn ContentPool> {
        Box::new(DefaultContentPool::new(self.pool_size()))
    }

    fn pooling_disabled(&self) -> bool {
        false
    }

    fn can_preallocate(&self) -> bool {
        false
    }

    fn pool_size(&self) -> usize {
        DEFAULT_POOL_SIZE
    }

    fn description(&self) -> &'static str {
        type_name::<Self>()
    }
}
