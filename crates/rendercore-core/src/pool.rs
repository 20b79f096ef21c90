//! Content recycling.
//!
//! Creating native content is expensive, so unmounted content is parked in a
//! per-type pool and handed back out on the next mount of the same type.
//! [`MountItemsPool`] is the registry of those pools. It is owned by the
//! embedder and shared with every [`MountState`](crate::MountState) of the
//! same UI thread.

use crate::collections::map::HashMap;
use crate::content::{Content, ContentAllocator, ContextScope, ScopeId};
use crate::error::RenderCoreError;
use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKey {
    Type(TypeId),
    Custom(u64),
}

impl PoolKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        PoolKey::Type(TypeId::of::<T>())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The same content object was released twice.
    AlreadyPooled,
    Rejected(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::AlreadyPooled => write!(f, "content is already in the pool"),
            PoolError::Rejected(reason) => write!(f, "pool rejected content: {reason}"),
        }
    }
}

impl std::error::Error for PoolError {}

pub trait ContentPool {
    fn acquire(&mut self) -> Option<Content>;

    /// Returns `Ok(false)` when the pool is full and the content was dropped.
    fn release(&mut self, content: Content) -> Result<bool, PoolError>;

    /// Creates one content object ahead of need. Returns false once full.
    fn maybe_preallocate(&mut self, scope: &ContextScope, allocator: &dyn ContentAllocator)
        -> bool;

    fn size(&self) -> usize;

    fn max_size(&self) -> usize;
}

/// Bounded LIFO pool.
#[derive(Debug)]
pub struct DefaultContentPool {
    items: Vec<Content>,
    max_size: usize,
}

impl DefaultContentPool {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_size),
            max_size,
        }
    }
}

impl ContentPool for DefaultContentPool {
    fn acquire(&mut self) -> Option<Content> {
        self.items.pop()
    }

    fn release(&mut self, content: Content) -> Result<bool, PoolError> {
        if self.items.iter().any(|pooled| pooled.ptr_eq(&content)) {
            return Err(PoolError::AlreadyPooled);
        }
        if self.items.len() >= self.max_size {
            return Ok(false);
        }
        self.items.push(content);
        Ok(true)
    }

    fn maybe_preallocate(
        &mut self,
        scope: &ContextScope,
        allocator: &dyn ContentAllocator,
    ) -> bool {
        if self.items.len() >= self.max_size {
            return false;
        }
        self.items.push(allocator.create_content(scope));
        true
    }

    fn size(&self) -> usize {
        self.items.len()
    }

    fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Registry of content pools keyed by scope and pool key.
pub struct MountItemsPool {
    pools: RefCell<HashMap<(ScopeId, PoolKey), Box<dyn ContentPool>>>,
    pooling_enabled: Cell<bool>,
}

impl Default for MountItemsPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MountItemsPool {
    pub fn new() -> Self {
        Self {
            pools: RefCell::new(HashMap::default()),
            pooling_enabled: Cell::new(true),
        }
    }

    pub fn set_pooling_enabled(&self, enabled: bool) {
        self.pooling_enabled.set(enabled);
        if !enabled {
            self.clear();
        }
    }

    pub fn is_pooling_enabled(&self) -> bool {
        self.pooling_enabled.get()
    }

    fn is_poolable(&self, allocator: &dyn ContentAllocator) -> bool {
        self.pooling_enabled.get() && !allocator.pooling_disabled() && allocator.pool_size() > 0
    }

    /// Hands out pooled content of the allocator's type, creating it when
    /// the pool is empty.
    pub fn acquire_content(
        &self,
        scope: &ContextScope,
        allocator: &dyn ContentAllocator,
    ) -> Content {
        if self.is_poolable(allocator) {
            let key = (scope.id(), allocator.pool_key());
            let pooled = self
                .pools
                .borrow_mut()
                .get_mut(&key)
                .and_then(|pool| pool.acquire());
            if let Some(content) = pooled {
                log::trace!("reusing pooled {}", allocator.description());
                return content;
            }
        }
        allocator.create_content(scope)
    }

    /// Parks content for reuse. Content that cannot be pooled is dropped.
    pub fn release_content(
        &self,
        scope: &ContextScope,
        allocator: &dyn ContentAllocator,
        content: Content,
    ) -> Result<(), RenderCoreError> {
        if !self.is_poolable(allocator) {
            return Ok(());
        }
        let content_type = content.type_name();
        let mut pools = self.pools.borrow_mut();
        let pool = pools
            .entry((scope.id(), allocator.pool_key()))
            .or_insert_with(|| allocator.create_pool());
        match pool.release(content) {
            Ok(true) => Ok(()),
            Ok(false) => {
                log::trace!("pool for {content_type} is full, dropping content");
                Ok(())
            }
            Err(source) => Err(RenderCoreError::PoolRelease {
                content_type,
                source,
            }),
        }
    }

    /// Warms the allocator's pool with up to `count` new content objects.
    /// Returns how many were created.
    pub fn preallocate(
        &self,
        scope: &ContextScope,
        allocator: &dyn ContentAllocator,
        count: usize,
    ) -> usize {
        if !allocator.can_preallocate() || !self.is_poolable(allocator) {
            return 0;
        }
        let mut pools = self.pools.borrow_mut();
        let pool = pools
            .entry((scope.id(), allocator.pool_key()))
            .or_insert_with(|| allocator.create_pool());
        let mut created = 0;
        while created < count && pool.maybe_preallocate(scope, allocator) {
            created += 1;
        }
        created
    }

    /// Number of content objects waiting in the allocator's pool.
    pub fn pooled_count(&self, scope: &ContextScope, allocator: &dyn ContentAllocator) -> usize {
        self.pools
            .borrow()
            .get(&(scope.id(), allocator.pool_key()))
            .map_or(0, |pool| pool.size())
    }

    /// Drops every pool created for `scope`.
    pub fn on_scope_destroyed(&self, scope: &ContextScope) {
        let id = scope.id();
        self.pools.borrow_mut().retain(|(scope_id, _), _| *scope_id != id);
        log::debug!("dropped content pools of scope {}", scope.name());
    }

    pub fn clear(&self) {
        self.pools.borrow_mut().clear();
    }
}

impl fmt::Debug for MountItemsPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountItemsPool")
            .field("pools", &self.pools.borrow().len())
            .field("pooling_enabled", &self.pooling_enabled.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/pool_tests.rs"]
mod tests;
