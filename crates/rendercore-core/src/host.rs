//! Containers that hold mounted content.

use crate::collections::map::HashMap;
use crate::content::{Content, MountContent};
use crate::render_unit::RenderUnitId;
use rendercore_graphics::{EdgeInsets, Rect};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// One child slot of a host.
#[derive(Clone, Debug, PartialEq)]
pub struct HostChild {
    pub id: RenderUnitId,
    pub content: Content,
}

impl HostChild {
    pub fn new(id: RenderUnitId, content: Content) -> Self {
        Self { id, content }
    }
}

/// Native container the mount engine inserts content into.
///
/// Indexes are positions within the host as computed by the reducer. They
/// need not be dense. `child_at` and `child_count` enumerate whatever is
/// currently held, in no particular order.
pub trait Host {
    fn mount(&self, index: usize, child: HostChild);

    /// Removes `child` from `index`. Returns false if it was not there.
    fn unmount(&self, index: usize, child: &HostChild) -> bool;

    fn move_item(&self, child: &HostChild, old_index: usize, new_index: usize);

    fn child_at(&self, ordinal: usize) -> Option<HostChild>;

    fn child_count(&self) -> usize;

    /// Part of the host currently visible on screen, in its own coordinates.
    fn local_visible_rect(&self) -> Option<Rect> {
        None
    }
}

/// Sparse index to child storage with a scrap area.
///
/// Moving a child onto an occupied index parks the occupant in scrap until
/// it is moved or unmounted itself, which lets a reorder be applied one move
/// at a time in any order.
#[derive(Debug, Default)]
pub struct HostChildren {
    children: BTreeMap<usize, HostChild>,
    scrap: HashMap<usize, HostChild>,
}

impl HostChildren {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, index: usize, child: HostChild) {
        if let Some(occupant) = self.children.insert(index, child) {
            log::trace!("index {index} occupied by {}, scrapping", occupant.id);
            self.scrap.insert(index, occupant);
        }
    }

    pub fn unmount(&mut self, index: usize, child: &HostChild) -> bool {
        if self.scrap.get(&index).is_some_and(|scrapped| scrapped == child) {
            self.scrap.remove(&index);
            return true;
        }
        if self.children.get(&index).is_some_and(|held| held == child) {
            self.children.remove(&index);
            return true;
        }
        false
    }

    pub fn move_item(&mut self, child: &HostChild, old_index: usize, new_index: usize) {
        let moved = if self.scrap.get(&old_index).is_some_and(|s| s == child) {
            self.scrap.remove(&old_index)
        } else if self.children.get(&old_index).is_some_and(|c| c == child) {
            self.children.remove(&old_index)
        } else {
            None
        };
        let moved = moved.unwrap_or_else(|| child.clone());
        self.mount(new_index, moved);
    }

    pub fn get(&self, index: usize) -> Option<&HostChild> {
        self.children.get(&index)
    }

    pub fn child_at(&self, ordinal: usize) -> Option<HostChild> {
        self.children
            .values()
            .chain(self.scrap.values())
            .nth(ordinal)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.children.len() + self.scrap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scrap_len(&self) -> usize {
        self.scrap.len()
    }

    /// Children in index order, scrap excluded.
    pub fn ids_in_order(&self) -> Vec<RenderUnitId> {
        self.children.values().map(|child| child.id).collect()
    }
}

/// Stock host content.
#[derive(Debug, Default)]
pub struct HostView {
    children: RefCell<HostChildren>,
    bounds: Cell<Rect>,
    padding: Cell<EdgeInsets>,
    visible_rect: Cell<Option<Rect>>,
}

impl HostView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    pub fn padding(&self) -> EdgeInsets {
        self.padding.get()
    }

    pub fn set_visible_rect(&self, rect: Option<Rect>) {
        self.visible_rect.set(rect);
    }

    pub fn child_ids(&self) -> Vec<RenderUnitId> {
        self.children.borrow().ids_in_order()
    }

    pub fn get(&self, index: usize) -> Option<HostChild> {
        self.children.borrow().get(index).cloned()
    }
}

impl Host for HostView {
    fn mount(&self, index: usize, child: HostChild) {
        self.children.borrow_mut().mount(index, child);
    }

    fn unmount(&self, index: usize, child: &HostChild) -> bool {
        self.children.borrow_mut().unmount(index, child)
    }

    fn move_item(&self, child: &HostChild, old_index: usize, new_index: usize) {
        self.children
            .borrow_mut()
            .move_item(child, old_index, new_index);
    }

    fn child_at(&self, ordinal: usize) -> Option<HostChild> {
        self.children.borrow().child_at(ordinal)
    }

    fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    fn local_visible_rect(&self) -> Option<Rect> {
        self.visible_rect.get()
    }
}

impl MountContent for HostView {
    fn as_host(&self) -> Option<&dyn Host> {
        Some(self)
    }

    fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }

    fn set_padding(&self, padding: EdgeInsets) {
        self.padding.set(padding);
    }
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
