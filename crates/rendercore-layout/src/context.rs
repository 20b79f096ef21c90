//! Per-pass layout context and the cache carried between passes.

use crate::collections::map::HashMap;
use std::any::Any;
use std::sync::Arc;

type CacheValue = Arc<dyn Any + Send + Sync>;

/// Key/value store that survives from one layout pass into the next.
///
/// Every pass writes into a fresh write map. Reads fall back to the entries
/// written by the previous pass; a hit there is promoted into the write map so
/// entries that are still in use keep surviving, while entries nobody asked
/// for are dropped after one generation.
#[derive(Default, Clone)]
pub struct LayoutCache {
    read: HashMap<u64, CacheValue>,
    write: HashMap<u64, CacheValue>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the cache for the next pass from what this pass wrote.
    pub fn carry_forward(&self) -> LayoutCache {
        log::trace!("layout cache carrying {} entries forward", self.write.len());
        LayoutCache {
            read: self.write.clone(),
            write: HashMap::default(),
        }
    }

    pub fn get<T: Any + Send + Sync>(&mut self, key: u64) -> Option<Arc<T>> {
        if let Some(value) = self.write.get(&key) {
            return value.clone().downcast::<T>().ok();
        }
        let value = self.read.get(&key)?.clone();
        let typed = value.clone().downcast::<T>().ok()?;
        self.write.insert(key, value);
        Some(typed)
    }

    pub fn put<T: Any + Send + Sync>(&mut self, key: u64, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.write.insert(key, value.clone());
        value
    }

    pub fn contains(&self, key: u64) -> bool {
        self.write.contains_key(&key) || self.read.contains_key(&key)
    }

    /// Number of entries written or promoted during the current pass.
    pub fn written_len(&self) -> usize {
        self.write.len()
    }
}

impl std::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCache")
            .field("read", &self.read.len())
            .field("write", &self.write.len())
            .finish()
    }
}

/// State available to a node while it calculates its layout.
#[derive(Debug)]
pub struct LayoutContext {
    render_state_id: u64,
    layout_version: u64,
    cache: LayoutCache,
}

impl LayoutContext {
    pub fn new(render_state_id: u64, layout_version: u64, cache: LayoutCache) -> Self {
        Self {
            render_state_id,
            layout_version,
            cache,
        }
    }

    pub fn render_state_id(&self) -> u64 {
        self.render_state_id
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    pub fn cache(&mut self) -> &mut LayoutCache {
        &mut self.cache
    }

    pub fn into_cache(self) -> LayoutCache {
        self.cache
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
