use super::*;
use crate::content::{MountContent, RenderType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Plain;

impl MountContent for Plain {}

#[derive(Default)]
struct CountingAllocator {
    created: AtomicUsize,
    size: usize,
    preallocate: bool,
}

impl ContentAllocator for CountingAllocator {
    fn create_content(&self, _scope: &ContextScope) -> Content {
        self.created.fetch_add(1, Ordering::SeqCst);
        Content::new(Plain)
    }

    fn render_type(&self) -> RenderType {
        RenderType::Drawable
    }

    fn can_preallocate(&self) -> bool {
        self.preallocate
    }

    fn pool_size(&self) -> usize {
        self.size
    }
}

fn allocator(size: usize) -> Arc<CountingAllocator> {
    Arc::new(CountingAllocator {
        size,
        preallocate: true,
        ..Default::default()
    })
}

#[test]
fn released_content_is_reused() {
    let pool = MountItemsPool::new();
    let scope = ContextScope::new("test");
    let allocator = allocator(2);

    let first = pool.acquire_content(&scope, &*allocator);
    pool.release_content(&scope, &*allocator, first.clone())
        .expect("release");
    let second = pool.acquire_content(&scope, &*allocator);

    assert!(first.ptr_eq(&second));
    assert_eq!(allocator.created.load(Ordering::SeqCst), 1);
}

#[test]
fn pools_are_scoped() {
    let pool = MountItemsPool::new();
    let window_a = ContextScope::new("a");
    let window_b = ContextScope::new("b");
    let allocator = allocator(2);

    let content = pool.acquire_content(&window_a, &*allocator);
    pool.release_content(&window_a, &*allocator, content.clone())
        .expect("release");
    let other = pool.acquire_content(&window_b, &*allocator);
    assert!(!other.ptr_eq(&content));

    pool.on_scope_destroyed(&window_a);
    assert_eq!(pool.pooled_count(&window_a, &*allocator), 0);
}

#[test]
fn double_release_reports_content_type() {
    let pool = MountItemsPool::new();
    let scope = ContextScope::new("test");
    let allocator = allocator(4);

    let content = pool.acquire_content(&scope, &*allocator);
    pool.release_content(&scope, &*allocator, content.clone())
        .expect("first release");
    let err = pool
        .release_content(&scope, &*allocator, content)
        .expect_err("second release must fail");
    match err {
        RenderCoreError::PoolRelease {
            content_type,
            source,
        } => {
            assert!(content_type.ends_with("Plain"));
            assert_eq!(source, PoolError::AlreadyPooled);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn zero_sized_or_disabled_pools_drop_content() {
    let pool = MountItemsPool::new();
    let scope = ContextScope::new("test");
    let unpooled = allocator(0);

    let content = pool.acquire_content(&scope, &*unpooled);
    pool.release_content(&scope, &*unpooled, content).expect("release");
    assert_eq!(pool.pooled_count(&scope, &*unpooled), 0);

    let pooled = allocator(3);
    pool.set_pooling_enabled(false);
    let content = pool.acquire_content(&scope, &*pooled);
    pool.release_content(&scope, &*pooled, content).expect("release");
    assert_eq!(pool.pooled_count(&scope, &*pooled), 0);
}

#[test]
fn preallocation_stops_at_max_size() {
    let pool = MountItemsPool::new();
    let scope = ContextScope::new("test");
    let allocator = allocator(3);

    assert_eq!(pool.preallocate(&scope, &*allocator, 10), 3);
    assert_eq!(pool.pooled_count(&scope, &*allocator), 3);
    assert_eq!(allocator.created.load(Ordering::SeqCst), 3);

    pool.acquire_content(&scope, &*allocator);
    assert_eq!(allocator.created.load(Ordering::SeqCst), 3);
}
