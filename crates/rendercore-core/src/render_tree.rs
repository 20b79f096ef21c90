//! Flattened, immutable output of a layout pass.

use crate::collections::map::HashMap;
use crate::content::RenderType;
use crate::error::RenderCoreError;
use crate::extension::{ExtensionInput, RenderCoreExtension};
use crate::render_unit::{LayoutData, RenderUnit, RenderUnitId, ROOT_HOST_ID};
use rendercore_graphics::{EdgeInsets, Point, Rect};
use rendercore_layout::SizeConstraints;
use std::fmt;
use std::sync::Arc;

/// One mountable node of a [`RenderTree`].
///
/// Links to parent and children are indexes into the owning tree's flat
/// node array.
pub struct RenderTreeNode {
    parent: Option<usize>,
    render_unit: Arc<RenderUnit>,
    layout_data: Option<Arc<dyn LayoutData>>,
    bounds: Rect,
    absolute_position: Point,
    resolved_padding: Option<EdgeInsets>,
    position_in_parent: usize,
    children: Vec<usize>,
}

impl RenderTreeNode {
    pub fn new(
        parent: Option<usize>,
        render_unit: Arc<RenderUnit>,
        layout_data: Option<Arc<dyn LayoutData>>,
        bounds: Rect,
        absolute_position: Point,
        resolved_padding: Option<EdgeInsets>,
        position_in_parent: usize,
    ) -> Self {
        Self {
            parent,
            render_unit,
            layout_data,
            bounds,
            absolute_position,
            resolved_padding,
            position_in_parent,
            children: Vec::new(),
        }
    }

    pub(crate) fn push_child(&mut self, index: usize) -> usize {
        self.children.push(index);
        self.children.len() - 1
    }

    #[inline]
    pub fn id(&self) -> RenderUnitId {
        self.render_unit.id()
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn render_unit(&self) -> &Arc<RenderUnit> {
        &self.render_unit
    }

    pub fn render_type(&self) -> RenderType {
        self.render_unit.render_type()
    }

    pub fn layout_data(&self) -> Option<&Arc<dyn LayoutData>> {
        self.layout_data.as_ref()
    }

    pub(crate) fn layout_data_ref(&self) -> Option<&dyn LayoutData> {
        self.layout_data.as_deref()
    }

    /// Bounds relative to the host this node is mounted in.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn absolute_position(&self) -> Point {
        self.absolute_position
    }

    pub fn absolute_bounds(&self) -> Rect {
        self.bounds.with_origin(self.absolute_position)
    }

    pub fn resolved_padding(&self) -> Option<EdgeInsets> {
        self.resolved_padding
    }

    /// Index of this node among its host's children.
    pub fn position_in_parent(&self) -> usize {
        self.position_in_parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl fmt::Debug for RenderTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTreeNode")
            .field("id", &self.id())
            .field("parent", &self.parent)
            .field("bounds", &self.bounds)
            .field("position_in_parent", &self.position_in_parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Input built for one extension while reducing.
#[derive(Clone)]
pub struct ExtensionResult {
    pub extension: Arc<dyn RenderCoreExtension>,
    pub input: Option<ExtensionInput>,
}

impl fmt::Debug for ExtensionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionResult")
            .field("extension", &self.extension.name())
            .field("has_input", &self.input.is_some())
            .finish()
    }
}

/// Immutable snapshot of everything that should be mounted.
///
/// Nodes are stored in mount order: index 0 is the root host and every
/// node comes after its parent.
pub struct RenderTree {
    nodes: Vec<Arc<RenderTreeNode>>,
    id_to_index: HashMap<RenderUnitId, usize>,
    size_constraints: SizeConstraints,
    render_state_id: u64,
    generation: u64,
    extension_results: Vec<ExtensionResult>,
}

impl RenderTree {
    pub fn new(
        nodes: Vec<RenderTreeNode>,
        size_constraints: SizeConstraints,
        render_state_id: u64,
        extension_results: Vec<ExtensionResult>,
    ) -> Result<Self, RenderCoreError> {
        match nodes.first() {
            Some(root) if root.id() == ROOT_HOST_ID && root.parent.is_none() => {}
            _ => return Err(RenderCoreError::MissingRootNode),
        }
        let mut id_to_index = HashMap::default();
        id_to_index.reserve(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent >= index {
                    return Err(RenderCoreError::InvalidParentIndex { index, parent });
                }
            } else if index != 0 {
                return Err(RenderCoreError::InvalidParentIndex { index, parent: index });
            }
            if let Some(first_index) = id_to_index.insert(node.id(), index) {
                return Err(RenderCoreError::DuplicateRenderUnitId {
                    id: node.id(),
                    first_index,
                    second_index: index,
                });
            }
        }
        Ok(Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
            id_to_index,
            size_constraints,
            render_state_id,
            generation: 0,
            extension_results,
        })
    }

    /// Stamps the layout pass that produced this tree.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn root(&self) -> &Arc<RenderTreeNode> {
        &self.nodes[0]
    }

    pub fn node_at(&self, index: usize) -> Option<&Arc<RenderTreeNode>> {
        self.nodes.get(index)
    }

    pub fn node_by_id(&self, id: RenderUnitId) -> Option<&Arc<RenderTreeNode>> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn index_of(&self, id: RenderUnitId) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    pub fn contains(&self, id: RenderUnitId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// Number of nodes including the root.
    pub fn mount_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Arc<RenderTreeNode>] {
        &self.nodes
    }

    /// Id of the node `index` is mounted into.
    pub fn parent_id(&self, index: usize) -> Option<RenderUnitId> {
        let parent = self.nodes.get(index)?.parent?;
        Some(self.nodes[parent].id())
    }

    pub fn width(&self) -> f32 {
        self.root().bounds.width
    }

    pub fn height(&self) -> f32 {
        self.root().bounds.height
    }

    pub fn size_constraints(&self) -> SizeConstraints {
        self.size_constraints
    }

    pub fn render_state_id(&self) -> u64 {
        self.render_state_id
    }

    /// Increases with every layout pass of the owning render state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn extension_results(&self) -> &[ExtensionResult] {
        &self.extension_results
    }
}

impl fmt::Debug for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTree")
            .field("render_state_id", &self.render_state_id)
            .field("generation", &self.generation)
            .field("nodes", &self.nodes)
            .field("size_constraints", &self.size_constraints)
            .field("extensions", &self.extension_results)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/render_tree_tests.rs"]
mod tests;
