//! Fan-out of mount lifecycle events to registered extensions, plus the
//! reference counts extensions use to gate mounting.

use crate::collections::map::{Entry, HashMap};
use crate::error::RenderCoreError;
use crate::extension::{
    AnyMountExtension, ItemEvent, MountTarget, MountedItemRef, RenderCoreExtension,
};
use crate::host::{Host, HostChild};
use crate::render_tree::{ExtensionResult, RenderTreeNode};
use crate::render_unit::RenderUnitId;
use rendercore_graphics::Rect;
use std::collections::VecDeque;
use std::sync::Arc;

/// Mount side effect requested by an extension outside a mount pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MountRequest {
    Mount(RenderUnitId),
    Unmount(RenderUnitId),
}

/// State shared by all extensions of one mount delegate.
#[derive(Debug, Default)]
pub struct DelegateCore {
    ref_counts: HashMap<RenderUnitId, u32>,
    reference_counting: bool,
    pending: VecDeque<MountRequest>,
    section_depth: u32,
    visible_bounds_dirty: bool,
}

impl DelegateCore {
    pub fn reference_count(&self, id: RenderUnitId) -> u32 {
        self.ref_counts.get(&id).copied().unwrap_or(0)
    }

    pub fn is_reference_counting_enabled(&self) -> bool {
        self.reference_counting
    }

    /// True when `id` may be mounted. Without a gating extension every
    /// node in the tree is mountable.
    pub fn maybe_lock_for_mount(&self, id: RenderUnitId) -> bool {
        !self.reference_counting || self.reference_count(id) > 0
    }

    /// Returns true when the count went from zero to one.
    pub(crate) fn acquire_mount_ref(&mut self, id: RenderUnitId) -> bool {
        let count = self.ref_counts.entry(id).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Returns true when the count reached zero.
    pub(crate) fn release_mount_ref(&mut self, id: RenderUnitId) -> Result<bool, RenderCoreError> {
        match self.ref_counts.entry(id) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() -= 1;
                if *entry.get() == 0 {
                    entry.remove();
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(_) => Err(RenderCoreError::ReferenceCountUnderflow { id }),
        }
    }

    pub(crate) fn acquire_and_mount_ref(&mut self, id: RenderUnitId) {
        if self.acquire_mount_ref(id) {
            self.pending.push_back(MountRequest::Mount(id));
        }
    }

    pub(crate) fn release_and_unmount_ref(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        if self.release_mount_ref(id)? {
            self.pending.push_back(MountRequest::Unmount(id));
        }
        Ok(())
    }

    pub(crate) fn next_request(&mut self) -> Option<MountRequest> {
        self.pending.pop_front()
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.pending.is_empty()
    }
}

struct Registered {
    source: Arc<dyn RenderCoreExtension>,
    extension: Box<dyn AnyMountExtension>,
}

/// Owns the extensions registered on one mount state.
#[derive(Default)]
pub struct MountDelegate {
    sources: Vec<Arc<dyn RenderCoreExtension>>,
    extensions: Vec<Registered>,
    core: DelegateCore,
}

impl MountDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core(&self) -> &DelegateCore {
        &self.core
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions
            .iter()
            .map(|registered| registered.extension.name())
            .collect()
    }

    /// True when the installed extensions came from exactly the extensions
    /// attached to the tree, in the same order.
    pub(crate) fn matches(&self, results: &[ExtensionResult]) -> bool {
        self.sources.len() == results.len()
            && self
                .sources
                .iter()
                .zip(results)
                .all(|(installed, result)| Arc::ptr_eq(installed, &result.extension))
    }

    pub(crate) fn register_from(&mut self, results: &[ExtensionResult]) {
        for result in results {
            self.sources.push(result.extension.clone());
            if let Some(extension) = result.extension.create_mount_extension() {
                log::debug!("registering mount extension {}", extension.name());
                self.core.reference_counting |= extension.can_prevent_mount();
                self.extensions.push(Registered {
                    source: result.extension.clone(),
                    extension,
                });
            }
        }
    }

    /// Unbinds, unmounts and drops every extension, releasing whatever
    /// references they still hold. Every extension is torn down even when
    /// an earlier one fails; the first failure is returned.
    pub(crate) fn unregister_all(&mut self, target: &dyn MountTarget) -> Result<(), RenderCoreError> {
        let mut first_error = None;
        for registered in &mut self.extensions {
            if let Err(err) = teardown(&mut *registered.extension, &mut self.core, target) {
                first_error.get_or_insert(err);
            }
        }
        self.sources.clear();
        self.extensions.clear();
        self.core.ref_counts.clear();
        self.core.pending.clear();
        self.core.reference_counting = false;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Extension inputs are matched to registered extensions by position.
    pub(crate) fn before_mount(
        &mut self,
        target: &dyn MountTarget,
        results: &[ExtensionResult],
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        for registered in &mut self.extensions {
            let input = results
                .iter()
                .find(|result| Arc::ptr_eq(&result.extension, &registered.source))
                .and_then(|result| result.input.as_ref());
            registered
                .extension
                .before_mount(&mut self.core, target, input, local_visible_rect)?;
        }
        // The mount pass itself evaluates every node.
        self.core.pending.clear();
        Ok(())
    }

    pub(crate) fn after_mount(&mut self, target: &dyn MountTarget) -> Result<(), RenderCoreError> {
        for registered in &mut self.extensions {
            registered.extension.after_mount(&mut self.core, target)?;
        }
        Ok(())
    }

    pub(crate) fn notify_visible_bounds_changed(
        &mut self,
        target: &dyn MountTarget,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        self.core.visible_bounds_dirty = false;
        for registered in &mut self.extensions {
            registered
                .extension
                .on_visible_bounds_changed(&mut self.core, target, local_visible_rect)?;
        }
        Ok(())
    }

    pub(crate) fn on_unbind(&mut self, target: &dyn MountTarget) -> Result<(), RenderCoreError> {
        for registered in &mut self.extensions {
            registered.extension.on_unbind(&mut self.core, target)?;
        }
        Ok(())
    }

    pub(crate) fn on_item(
        &mut self,
        event: ItemEvent,
        target: &dyn MountTarget,
        item: MountedItemRef<'_>,
    ) -> Result<(), RenderCoreError> {
        for registered in &mut self.extensions {
            registered
                .extension
                .on_item(event, &mut self.core, target, item)?;
        }
        Ok(())
    }

    pub(crate) fn on_bounds_applied_to_item(
        &mut self,
        target: &dyn MountTarget,
        item: MountedItemRef<'_>,
        changed: bool,
    ) -> Result<(), RenderCoreError> {
        for registered in &mut self.extensions {
            registered
                .extension
                .on_bounds_applied_to_item(&mut self.core, target, item, changed)?;
        }
        Ok(())
    }

    pub(crate) fn should_update_item(&self, previous: &RenderTreeNode, next: &RenderTreeNode) -> bool {
        self.extensions
            .iter()
            .any(|registered| registered.extension.should_update_item(previous, next))
    }

    /// Index of the first extension that takes over unmounting `item`.
    pub(crate) fn unmount_delegate_for(&self, item: MountedItemRef<'_>) -> Option<usize> {
        self.extensions.iter().position(|registered| {
            registered.extension.delegates_unmount()
                && registered.extension.should_delegate_unmount(item)
        })
    }

    pub(crate) fn delegate_unmount(
        &mut self,
        delegate: usize,
        target: &dyn MountTarget,
        host: &dyn Host,
        index: usize,
        child: &HostChild,
    ) -> Result<(), RenderCoreError> {
        let registered = &mut self.extensions[delegate];
        registered
            .extension
            .unmount(&mut self.core, target, host, index, child)
    }

    pub fn has_items_to_premount(&self) -> bool {
        self.extensions
            .iter()
            .any(|registered| registered.extension.has_items_to_premount())
    }

    /// Lets the first extension with pending work premount one item.
    pub(crate) fn premount_next(&mut self, target: &dyn MountTarget) -> Result<bool, RenderCoreError> {
        for registered in &mut self.extensions {
            if registered.extension.has_items_to_premount() {
                return registered.extension.premount_next(&mut self.core, target);
            }
        }
        Ok(false)
    }

    pub(crate) fn next_request(&mut self) -> Option<MountRequest> {
        self.core.next_request()
    }

    /// Opens a section in which visible bounds notifications are coalesced.
    pub(crate) fn start_notify_visible_bounds_changed_section(&mut self) {
        self.core.section_depth += 1;
    }

    /// Closes a section. Returns true when the outermost section closed with
    /// a coalesced notification waiting.
    pub(crate) fn end_notify_visible_bounds_changed_section(&mut self) -> bool {
        self.core.section_depth = self.core.section_depth.saturating_sub(1);
        self.core.section_depth == 0 && self.core.visible_bounds_dirty
    }

    /// Records that a host moved or resized. Returns true when the caller
    /// should notify right away because no section is open.
    pub(crate) fn request_visible_bounds_notification(&mut self) -> bool {
        self.core.visible_bounds_dirty = true;
        self.core.section_depth == 0
    }

    pub(crate) fn reset_sections(&mut self) {
        self.core.section_depth = 0;
        self.core.visible_bounds_dirty = false;
    }
}

fn teardown(
    extension: &mut dyn AnyMountExtension,
    core: &mut DelegateCore,
    target: &dyn MountTarget,
) -> Result<(), RenderCoreError> {
    extension.on_unbind(core, target)?;
    extension.on_unmount(core, target)?;
    extension.release_all_acquired_references(core, target)
}

#[cfg(test)]
#[path = "tests/mount_delegate_tests.rs"]
mod tests;
