//! Extension points of the reduce and mount phases.
//!
//! A [`RenderCoreExtension`] is attached to a render tree when it is reduced.
//! It may contribute a [`LayoutVisitor`] that builds its input during the
//! reducer's single walk, and a [`MountExtension`] that observes, and may
//! gate, the mounting of that tree.

use crate::collections::map::HashSet;
use crate::content::Content;
use crate::error::RenderCoreError;
use crate::host::{Host, HostChild};
use crate::layout_result::LayoutResult;
use crate::mount_delegate::DelegateCore;
use crate::render_tree::RenderTreeNode;
use crate::render_unit::{LayoutData, RenderUnit, RenderUnitId};
use rendercore_graphics::Rect;
use std::any::{type_name, Any};
use std::sync::Arc;

/// Input an extension's visitor produced for one render tree.
pub type ExtensionInput = Arc<dyn Any + Send + Sync>;

/// A layout node as seen by a visitor during reduction.
pub struct VisitedNode<'a> {
    pub layout: &'a dyn LayoutResult,
    pub render_unit: Option<&'a Arc<RenderUnit>>,
    pub absolute_bounds: Rect,
    /// Index of the render tree node created for this layout node, if any.
    pub index: Option<usize>,
    pub host_index: usize,
}

pub trait LayoutVisitor: Send {
    fn visit(&mut self, node: &VisitedNode<'_>);

    fn finish(self: Box<Self>) -> Option<ExtensionInput>;
}

pub trait RenderCoreExtension: Send + Sync + 'static {
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn create_layout_visitor(&self) -> Option<Box<dyn LayoutVisitor>> {
        None
    }

    fn create_mount_extension(&self) -> Option<Box<dyn AnyMountExtension>> {
        None
    }
}

/// Read-only view of what is currently mounted.
pub trait MountTarget {
    fn is_mounted(&self, id: RenderUnitId) -> bool;

    fn content_by_id(&self, id: RenderUnitId) -> Option<Content>;

    fn root_host(&self) -> Option<Content>;
}

/// A mounted item as reported to extension callbacks.
#[derive(Clone, Copy)]
pub struct MountedItemRef<'a> {
    pub node: &'a RenderTreeNode,
    pub content: &'a Content,
}

impl<'a> MountedItemRef<'a> {
    pub fn id(&self) -> RenderUnitId {
        self.node.id()
    }

    pub fn render_unit(&self) -> &'a Arc<RenderUnit> {
        self.node.render_unit()
    }

    pub fn layout_data(&self) -> Option<&'a dyn LayoutData> {
        self.node.layout_data_ref()
    }
}

/// What an extension can see and do while one of its hooks runs.
pub struct ExtensionState<'a, S> {
    name: &'static str,
    state: &'a mut S,
    owned: &'a mut HashSet<RenderUnitId>,
    core: &'a mut DelegateCore,
    target: &'a dyn MountTarget,
}

impl<'a, S> ExtensionState<'a, S> {
    pub fn state(&self) -> &S {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    pub fn target(&self) -> &dyn MountTarget {
        self.target
    }

    pub fn is_mounted(&self, id: RenderUnitId) -> bool {
        self.target.is_mounted(id)
    }

    pub fn owns_reference(&self, id: RenderUnitId) -> bool {
        self.owned.contains(&id)
    }

    pub fn owned_references(&self) -> impl Iterator<Item = RenderUnitId> + '_ {
        self.owned.iter().copied()
    }

    pub fn reference_count(&self, id: RenderUnitId) -> u32 {
        self.core.reference_count(id)
    }

    /// Takes a mount reference on `id`.
    ///
    /// Outside a mount pass (`is_mounting == false`) the first reference
    /// also mounts the item once the current hook returns.
    pub fn acquire_mount_reference(
        &mut self,
        id: RenderUnitId,
        is_mounting: bool,
    ) -> Result<(), RenderCoreError> {
        if !self.owned.insert(id) {
            return Err(RenderCoreError::ReferenceAlreadyOwned {
                extension: self.name,
                id,
            });
        }
        if is_mounting {
            self.core.acquire_mount_ref(id);
        } else {
            self.core.acquire_and_mount_ref(id);
        }
        Ok(())
    }

    /// Drops a mount reference taken by this extension.
    ///
    /// Outside a mount pass the last reference also unmounts the item once
    /// the current hook returns.
    pub fn release_mount_reference(
        &mut self,
        id: RenderUnitId,
        is_mounting: bool,
    ) -> Result<(), RenderCoreError> {
        if !self.owned.remove(&id) {
            return Err(RenderCoreError::ReferenceNotOwned {
                extension: self.name,
                id,
            });
        }
        if is_mounting {
            self.core.release_mount_ref(id).map(|_| ())
        } else {
            self.core.release_and_unmount_ref(id)
        }
    }

    /// Drops every reference this extension holds without unmounting.
    pub fn release_all_acquired_references(&mut self) -> Result<(), RenderCoreError> {
        for id in self.owned.drain() {
            self.core.release_mount_ref(id)?;
        }
        Ok(())
    }
}

/// Typed mount lifecycle hooks. Every hook defaults to a no-op.
#[allow(unused_variables)]
pub trait MountExtension: 'static {
    type Input: Any + Send + Sync;
    type State: 'static;

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn create_state(&self) -> Self::State;

    /// Extensions that can prevent mount turn on reference counting.
    fn can_prevent_mount(&self) -> bool {
        false
    }

    fn before_mount(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        input: Option<Arc<Self::Input>>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn after_mount(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_visible_bounds_changed(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_unbind(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_unmount(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_mount_item(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_bind_item(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_unbind_item(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_unmount_item(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    fn on_bounds_applied_to_item(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        item: MountedItemRef<'_>,
        changed: bool,
    ) -> Result<(), RenderCoreError> {
        Ok(())
    }

    /// Forces an update of an item whose unit and layout data are unchanged.
    fn should_update_item(
        &self,
        state: &Self::State,
        previous: &RenderTreeNode,
        next: &RenderTreeNode,
    ) -> bool {
        false
    }

    /// Extensions that may take over unmounting return true here.
    fn delegates_unmount(&self) -> bool {
        false
    }

    fn should_delegate_unmount(&self, state: &Self::State, item: MountedItemRef<'_>) -> bool {
        false
    }

    /// Removes `child` from `host` in place of the default path. Content
    /// unmounted this way is not returned to its pool.
    fn unmount(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        host: &dyn Host,
        index: usize,
        child: &HostChild,
    ) -> Result<(), RenderCoreError> {
        host.unmount(index, child);
        Ok(())
    }

    fn has_items_to_premount(&self, state: &Self::State) -> bool {
        false
    }

    /// Mounts one more item ahead of need. Returns true if it did any work.
    fn premount_next(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
    ) -> Result<bool, RenderCoreError> {
        Ok(false)
    }

    fn into_any(self) -> Box<dyn AnyMountExtension>
    where
        Self: Sized,
    {
        Box::new(ExtensionHolder {
            extension: self,
            state: None,
            owned: HashSet::default(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemEvent {
    Mount,
    Bind,
    Unbind,
    Unmount,
}

/// Type-erased [`MountExtension`] together with its state.
pub trait AnyMountExtension {
    fn name(&self) -> &'static str;

    fn can_prevent_mount(&self) -> bool;

    fn before_mount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        input: Option<&ExtensionInput>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError>;

    fn after_mount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError>;

    fn on_visible_bounds_changed(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError>;

    fn on_unbind(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError>;

    fn on_unmount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError>;

    fn on_item(
        &mut self,
        event: ItemEvent,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError>;

    fn on_bounds_applied_to_item(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        item: MountedItemRef<'_>,
        changed: bool,
    ) -> Result<(), RenderCoreError>;

    fn should_update_item(&self, previous: &RenderTreeNode, next: &RenderTreeNode) -> bool;

    fn delegates_unmount(&self) -> bool;

    fn should_delegate_unmount(&self, item: MountedItemRef<'_>) -> bool;

    fn unmount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        host: &dyn Host,
        index: usize,
        child: &HostChild,
    ) -> Result<(), RenderCoreError>;

    fn has_items_to_premount(&self) -> bool;

    fn premount_next(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<bool, RenderCoreError>;

    fn release_all_acquired_references(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError>;
}

struct ExtensionHolder<E: MountExtension> {
    extension: E,
    /// Created lazily so the state exists before the first hook runs.
    state: Option<E::State>,
    owned: HashSet<RenderUnitId>,
}

impl<E: MountExtension> ExtensionHolder<E> {
    fn run<R>(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        hook: impl FnOnce(&E, &mut ExtensionState<'_, E::State>) -> R,
    ) -> R {
        let Self {
            extension,
            state,
            owned,
        } = self;
        let state = state.get_or_insert_with(|| extension.create_state());
        let mut view = ExtensionState {
            name: extension.name(),
            state,
            owned,
            core,
            target,
        };
        hook(&*extension, &mut view)
    }

    fn peek<R>(&self, default: R, query: impl FnOnce(&E, &E::State) -> R) -> R {
        match &self.state {
            Some(state) => query(&self.extension, state),
            None => default,
        }
    }
}

impl<E: MountExtension> AnyMountExtension for ExtensionHolder<E> {
    fn name(&self) -> &'static str {
        self.extension.name()
    }

    fn can_prevent_mount(&self) -> bool {
        self.extension.can_prevent_mount()
    }

    fn before_mount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        input: Option<&ExtensionInput>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        let input = match input {
            Some(input) => Some(input.clone().downcast::<E::Input>().map_err(|_| {
                RenderCoreError::extension(
                    self.extension.name(),
                    format!("input is not a {}", type_name::<E::Input>()),
                )
            })?),
            None => None,
        };
        self.run(core, target, |extension, state| {
            extension.before_mount(state, input, local_visible_rect)
        })
    }

    fn after_mount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| extension.after_mount(state))
    }

    fn on_visible_bounds_changed(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| {
            extension.on_visible_bounds_changed(state, local_visible_rect)
        })
    }

    fn on_unbind(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| extension.on_unbind(state))
    }

    fn on_unmount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| extension.on_unmount(state))
    }

    fn on_item(
        &mut self,
        event: ItemEvent,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| match event {
            ItemEvent::Mount => extension.on_mount_item(state, item),
            ItemEvent::Bind => extension.on_bind_item(state, item),
            ItemEvent::Unbind => extension.on_unbind_item(state, item),
            ItemEvent::Unmount => extension.on_unmount_item(state, item),
        })
    }

    fn on_bounds_applied_to_item(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        item: MountedItemRef<'_>,
        changed: bool,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| {
            extension.on_bounds_applied_to_item(state, item, changed)
        })
    }

    fn should_update_item(&self, previous: &RenderTreeNode, next: &RenderTreeNode) -> bool {
        self.peek(false, |extension, state| {
            extension.should_update_item(state, previous, next)
        })
    }

    fn delegates_unmount(&self) -> bool {
        self.extension.delegates_unmount()
    }

    fn should_delegate_unmount(&self, item: MountedItemRef<'_>) -> bool {
        self.peek(false, |extension, state| {
            extension.should_delegate_unmount(state, item)
        })
    }

    fn unmount(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
        host: &dyn Host,
        index: usize,
        child: &HostChild,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |extension, state| {
            extension.unmount(state, host, index, child)
        })
    }

    fn has_items_to_premount(&self) -> bool {
        self.peek(false, |extension, state| {
            extension.has_items_to_premount(state)
        })
    }

    fn premount_next(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<bool, RenderCoreError> {
        self.run(core, target, |extension, state| extension.premount_next(state))
    }

    fn release_all_acquired_references(
        &mut self,
        core: &mut DelegateCore,
        target: &dyn MountTarget,
    ) -> Result<(), RenderCoreError> {
        self.run(core, target, |_, state| state.release_all_acquired_references())
    }
}
