//! Viewport-driven mounting.
//!
//! The extension holds a mount reference on every render unit whose
//! absolute bounds intersect the root host's visible rect, so the mount
//! pass leaves everything else unmounted. Units near the viewport can be
//! premounted ahead of need one at a time.

use rendercore_core::{
    AnyMountExtension, ExtensionInput, ExtensionState, LayoutVisitor, MountExtension, Rect,
    RenderCoreError, RenderCoreExtension, RenderUnitId, VisitedNode,
};
use rendercore_layout::collections::map::{HashMap, HashSet};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IncrementalMountConfig {
    /// Distance above and below the visible rect within which units are
    /// premounted.
    pub premount_distance: f32,
}

impl Default for IncrementalMountConfig {
    fn default() -> Self {
        Self {
            premount_distance: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IncrementalMountNode {
    pub id: RenderUnitId,
    /// Bounds in root host coordinates.
    pub bounds: Rect,
    /// Unit this one is mounted inside, `None` for the root host.
    pub host: Option<RenderUnitId>,
}

/// Absolute bounds of every render unit of one tree, in mount order.
#[derive(Clone, Debug, Default)]
pub struct IncrementalMountInput {
    nodes: Vec<IncrementalMountNode>,
    hosts: HashMap<RenderUnitId, RenderUnitId>,
}

impl IncrementalMountInput {
    pub fn new(nodes: Vec<IncrementalMountNode>) -> Self {
        let hosts = nodes
            .iter()
            .filter_map(|node| node.host.map(|host| (node.id, host)))
            .collect();
        Self { nodes, hosts }
    }

    pub fn nodes(&self) -> &[IncrementalMountNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bounds_of(&self, id: RenderUnitId) -> Option<Rect> {
        self.nodes
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.bounds)
    }

    pub fn host_of(&self, id: RenderUnitId) -> Option<RenderUnitId> {
        self.hosts.get(&id).copied()
    }

    /// Hosts enclosing `id`, innermost first.
    pub fn hosts_of(&self, id: RenderUnitId) -> impl Iterator<Item = RenderUnitId> + '_ {
        std::iter::successors(self.host_of(id), move |host| self.host_of(*host))
    }
}

#[derive(Debug, Default)]
pub struct IncrementalMountExtension {
    config: IncrementalMountConfig,
}

impl IncrementalMountExtension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IncrementalMountConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> IncrementalMountConfig {
        self.config
    }
}

impl RenderCoreExtension for IncrementalMountExtension {
    fn name(&self) -> &'static str {
        "IncrementalMount"
    }

    fn create_layout_visitor(&self) -> Option<Box<dyn LayoutVisitor>> {
        Some(Box::new(BoundsCollector::default()))
    }

    fn create_mount_extension(&self) -> Option<Box<dyn AnyMountExtension>> {
        Some(
            IncrementalMount {
                config: self.config,
            }
            .into_any(),
        )
    }
}

#[derive(Default)]
struct BoundsCollector {
    nodes: Vec<IncrementalMountNode>,
    ids_by_index: HashMap<usize, RenderUnitId>,
}

impl LayoutVisitor for BoundsCollector {
    fn visit(&mut self, node: &VisitedNode<'_>) {
        if let (Some(index), Some(unit)) = (node.index, node.render_unit) {
            if index > 0 {
                // Hosts are visited before their children.
                let host = self.ids_by_index.get(&node.host_index).copied();
                self.ids_by_index.insert(index, unit.id());
                self.nodes.push(IncrementalMountNode {
                    id: unit.id(),
                    bounds: node.absolute_bounds,
                    host,
                });
            }
        }
    }

    fn finish(self: Box<Self>) -> Option<ExtensionInput> {
        Some(Arc::new(IncrementalMountInput::new(self.nodes)))
    }
}

#[derive(Default)]
struct IncrementalMountState {
    input: Option<Arc<IncrementalMountInput>>,
    visible_rect: Option<Rect>,
    premount: VecDeque<RenderUnitId>,
}

struct IncrementalMount {
    config: IncrementalMountConfig,
}

/// Zero-sized units count as visible when their origin is inside `visible`.
fn is_visible(visible: &Rect, bounds: &Rect) -> bool {
    visible.intersects(bounds) || (bounds.is_empty() && visible.contains(bounds.x, bounds.y))
}

impl IncrementalMount {
    /// Holds references on visible units and on premounted units still
    /// within premount distance, and drops all others. Hosts of a held unit
    /// are held too, since unmounting a host takes its children with it.
    fn update_references(
        &self,
        state: &mut ExtensionState<'_, IncrementalMountState>,
        is_mounting: bool,
    ) -> Result<(), RenderCoreError> {
        let (input, visible_rect) = {
            let current = state.state();
            (current.input.clone(), current.visible_rect)
        };
        let Some(input) = input else {
            return Ok(());
        };
        let premount_rect =
            visible_rect.map(|rect| rect.expand_vertically(self.config.premount_distance));

        let mut keep = HashSet::default();
        let mut premount = VecDeque::new();
        for node in input.nodes() {
            let (Some(visible), Some(near)) = (visible_rect, premount_rect) else {
                // Nothing is known about the viewport yet.
                keep.insert(node.id);
                continue;
            };
            if is_visible(&visible, &node.bounds) {
                keep.insert(node.id);
            } else if is_visible(&near, &node.bounds) {
                if state.owns_reference(node.id) {
                    keep.insert(node.id);
                } else {
                    premount.push_back(node.id);
                }
            }
        }
        let held: Vec<_> = keep.iter().copied().collect();
        for id in held {
            for host in input.hosts_of(id) {
                if !keep.insert(host) {
                    break;
                }
            }
        }

        let stale: Vec<_> = state
            .owned_references()
            .filter(|id| !keep.contains(id))
            .collect();
        for id in stale {
            state.release_mount_reference(id, is_mounting)?;
        }
        for node in input.nodes() {
            if keep.contains(&node.id) && !state.owns_reference(node.id) {
                state.acquire_mount_reference(node.id, is_mounting)?;
            }
        }
        log::trace!(
            "incremental mount holds {} of {} units, {} to premount",
            keep.len(),
            input.len(),
            premount.len()
        );
        state.state_mut().premount = premount;
        Ok(())
    }
}

impl MountExtension for IncrementalMount {
    type Input = IncrementalMountInput;
    type State = IncrementalMountState;

    fn name(&self) -> &'static str {
        "IncrementalMount"
    }

    fn create_state(&self) -> Self::State {
        IncrementalMountState::default()
    }

    fn can_prevent_mount(&self) -> bool {
        true
    }

    fn before_mount(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        input: Option<Arc<IncrementalMountInput>>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        let current = state.state_mut();
        current.input = input;
        current.visible_rect = local_visible_rect;
        self.update_references(state, true)
    }

    fn on_visible_bounds_changed(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        state.state_mut().visible_rect = local_visible_rect;
        self.update_references(state, false)
    }

    fn on_unmount(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        let current = state.state_mut();
        current.input = None;
        current.premount.clear();
        Ok(())
    }

    fn has_items_to_premount(&self, state: &Self::State) -> bool {
        !state.premount.is_empty()
    }

    fn premount_next(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
    ) -> Result<bool, RenderCoreError> {
        let input = state.state().input.clone();
        while let Some(id) = state.state_mut().premount.pop_front() {
            if state.owns_reference(id) {
                continue;
            }
            log::trace!("premounting {id}");
            let mut chain: Vec<_> = input
                .iter()
                .flat_map(|input| input.hosts_of(id))
                .collect();
            chain.reverse();
            chain.push(id);
            for unit in chain {
                if !state.owns_reference(unit) {
                    state.acquire_mount_reference(unit, false)?;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "tests/incremental_mount_tests.rs"]
mod tests;
