//! Content that records what the mount engine does to it.

use rendercore_core::{
    Content, ContentAllocator, ContextScope, EdgeInsets, Host, HostChild, HostView, MountContent,
    PoolKey, Rect, RenderType, RenderUnitId,
};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// One observable side effect of a mount pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Mount {
        host: u64,
        index: usize,
        id: RenderUnitId,
    },
    Unmount {
        host: u64,
        index: usize,
        id: RenderUnitId,
    },
    Move {
        host: u64,
        from: usize,
        to: usize,
        id: RenderUnitId,
    },
    Bind {
        binder: &'static str,
        model: u32,
    },
    Unbind {
        binder: &'static str,
        model: u32,
    },
}

/// Shared, ordered record of [`Operation`]s.
#[derive(Clone, Default)]
pub struct OperationLog {
    entries: Arc<Mutex<Vec<Operation>>>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Operation>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, operation: Operation) {
        log::trace!("recorded {operation:?}");
        self.entries().push(operation);
    }

    pub fn snapshot(&self) -> Vec<Operation> {
        self.entries().clone()
    }

    /// Returns everything recorded so far and starts over.
    pub fn take(&self) -> Vec<Operation> {
        std::mem::take(&mut *self.entries())
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Ids passed to `Host::mount`, in call order.
    pub fn mounted_ids(&self) -> Vec<RenderUnitId> {
        self.filter_ids(|operation| match operation {
            Operation::Mount { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// Ids passed to `Host::unmount`, in call order.
    pub fn unmounted_ids(&self) -> Vec<RenderUnitId> {
        self.filter_ids(|operation| match operation {
            Operation::Unmount { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// Ids passed to `Host::move_item`, in call order.
    pub fn moved_ids(&self) -> Vec<RenderUnitId> {
        self.filter_ids(|operation| match operation {
            Operation::Move { id, .. } => Some(*id),
            _ => None,
        })
    }

    fn filter_ids(&self, select: impl Fn(&Operation) -> Option<RenderUnitId>) -> Vec<RenderUnitId> {
        self.entries().iter().filter_map(select).collect()
    }
}

impl std::fmt::Debug for OperationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries().iter()).finish()
    }
}

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Host view that logs every child operation before applying it.
pub struct RecordingHostView {
    tag: u64,
    view: HostView,
    log: OperationLog,
}

impl RecordingHostView {
    pub fn new(log: OperationLog) -> Self {
        Self {
            tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
            view: HostView::new(),
            log,
        }
    }

    /// Identifies this host in recorded operations.
    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn view(&self) -> &HostView {
        &self.view
    }

    /// Child ids ordered by position, scrapped children last.
    pub fn child_ids(&self) -> Vec<RenderUnitId> {
        self.view.child_ids()
    }

    pub fn bounds(&self) -> Rect {
        self.view.bounds()
    }

    pub fn padding(&self) -> EdgeInsets {
        self.view.padding()
    }

    pub fn set_visible_rect(&self, rect: Option<Rect>) {
        self.view.set_visible_rect(rect);
    }
}

impl Host for RecordingHostView {
    fn mount(&self, index: usize, child: HostChild) {
        self.log.push(Operation::Mount {
            host: self.tag,
            index,
            id: child.id,
        });
        self.view.mount(index, child);
    }

    fn unmount(&self, index: usize, child: &HostChild) -> bool {
        self.log.push(Operation::Unmount {
            host: self.tag,
            index,
            id: child.id,
        });
        self.view.unmount(index, child)
    }

    fn move_item(&self, child: &HostChild, old_index: usize, new_index: usize) {
        self.log.push(Operation::Move {
            host: self.tag,
            from: old_index,
            to: new_index,
            id: child.id,
        });
        self.view.move_item(child, old_index, new_index);
    }

    fn child_at(&self, ordinal: usize) -> Option<HostChild> {
        self.view.child_at(ordinal)
    }

    fn child_count(&self) -> usize {
        self.view.child_count()
    }

    fn local_visible_rect(&self) -> Option<Rect> {
        self.view.local_visible_rect()
    }
}

impl MountContent for RecordingHostView {
    fn as_host(&self) -> Option<&dyn Host> {
        Some(self)
    }

    fn set_bounds(&self, bounds: Rect) {
        self.view.set_bounds(bounds);
    }

    fn set_padding(&self, padding: EdgeInsets) {
        self.view.set_padding(padding);
    }
}

/// Leaf content that remembers its bounds and padding.
pub struct TestDrawable {
    serial: u64,
    bounds: Cell<Rect>,
    padding: Cell<EdgeInsets>,
}

impl TestDrawable {
    pub fn new() -> Self {
        Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            bounds: Cell::new(Rect::ZERO),
            padding: Cell::new(EdgeInsets::ZERO),
        }
    }

    /// Unique per instance, in creation order.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    pub fn padding(&self) -> EdgeInsets {
        self.padding.get()
    }
}

impl Default for TestDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl MountContent for TestDrawable {
    fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }

    fn set_padding(&self, padding: EdgeInsets) {
        self.padding.set(padding);
    }
}

/// Creates [`RecordingHostView`]s that log into a shared [`OperationLog`].
pub struct HostAllocator {
    log: OperationLog,
    created: AtomicUsize,
}

impl HostAllocator {
    pub fn new(log: OperationLog) -> Self {
        Self {
            log,
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl ContentAllocator for HostAllocator {
    fn create_content(&self, _scope: &ContextScope) -> Content {
        self.created.fetch_add(1, Ordering::Relaxed);
        Content::new(RecordingHostView::new(self.log.clone()))
    }

    fn render_type(&self) -> RenderType {
        RenderType::View
    }

    fn description(&self) -> &'static str {
        "RecordingHostView"
    }
}

/// Creates [`TestDrawable`]s. Allocators with different keys produce
/// content of different types as far as pooling and reuse are concerned.
pub struct TestDrawableAllocator {
    key: u64,
    pool_size: usize,
    created: AtomicUsize,
}

impl TestDrawableAllocator {
    pub fn new() -> Self {
        Self::with_key(0)
    }

    pub fn with_key(key: u64) -> Self {
        Self {
            key,
            pool_size: rendercore_core::content::DEFAULT_POOL_SIZE,
            created: AtomicUsize::new(0),
        }
    }

    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl Default for TestDrawableAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentAllocator for TestDrawableAllocator {
    fn create_content(&self, _scope: &ContextScope) -> Content {
        self.created.fetch_add(1, Ordering::Relaxed);
        Content::new(TestDrawable::new())
    }

    fn render_type(&self) -> RenderType {
        RenderType::Drawable
    }

    fn pool_key(&self) -> PoolKey {
        PoolKey::Custom(self.key)
    }

    fn can_preallocate(&self) -> bool {
        true
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn description(&self) -> &'static str {
        "TestDrawable"
    }
}
