//! Flattens a layout result tree into a [`RenderTree`].

use crate::content::RenderType;
use crate::error::RenderCoreError;
use crate::extension::{LayoutVisitor, RenderCoreExtension, VisitedNode};
use crate::layout_result::LayoutResult;
use crate::render_tree::{ExtensionResult, RenderTree, RenderTreeNode};
use crate::render_unit::RenderUnit;
use rendercore_graphics::{Point, Rect};
use rendercore_layout::SizeConstraints;
use std::sync::Arc;

struct Reduction {
    nodes: Vec<RenderTreeNode>,
    visitors: Vec<Option<Box<dyn LayoutVisitor>>>,
}

/// Builds a render tree from `root`.
///
/// A layout node without a render unit only contributes its offset to its
/// descendants. A node whose unit is a view with children becomes a host;
/// its descendants are positioned relative to it. Every extension's visitor
/// sees every layout node in the same walk.
pub fn reduce(
    root: &dyn LayoutResult,
    size_constraints: SizeConstraints,
    render_state_id: u64,
    extensions: &[Arc<dyn RenderCoreExtension>],
) -> Result<RenderTree, RenderCoreError> {
    let root_node = RenderTreeNode::new(
        None,
        RenderUnit::root(),
        None,
        Rect::new(0.0, 0.0, root.width(), root.height()),
        Point::ZERO,
        None,
        0,
    );
    let mut reduction = Reduction {
        nodes: vec![root_node],
        visitors: extensions
            .iter()
            .map(|extension| extension.create_layout_visitor())
            .collect(),
    };

    reduction.visit(root, 0, Point::ZERO, Point::ZERO);

    let extension_results = extensions
        .iter()
        .zip(reduction.visitors)
        .map(|(extension, visitor)| ExtensionResult {
            extension: extension.clone(),
            input: visitor.and_then(|visitor| visitor.finish()),
        })
        .collect();

    log::trace!(
        "reduced layout into {} render tree nodes",
        reduction.nodes.len()
    );
    RenderTree::new(
        reduction.nodes,
        size_constraints,
        render_state_id,
        extension_results,
    )
}

impl Reduction {
    /// `offset` is the position of `result` relative to `host`, whose own
    /// absolute position is `host_position`.
    fn visit(
        &mut self,
        result: &dyn LayoutResult,
        host: usize,
        host_position: Point,
        offset: Point,
    ) {
        let bounds = Rect::new(offset.x, offset.y, result.width(), result.height());
        let absolute_position = host_position + offset;

        let mut index = None;
        let (child_host, child_host_position, child_origin) = match result.render_unit() {
            Some(unit) => {
                let node_index = self.nodes.len();
                let position = self.nodes[host].push_child(node_index);
                let padding = result.padding();
                self.nodes.push(RenderTreeNode::new(
                    Some(host),
                    unit.clone(),
                    result.layout_data().cloned(),
                    bounds,
                    absolute_position,
                    (!padding.is_zero()).then_some(padding),
                    position,
                ));
                index = Some(node_index);
                if unit.render_type() == RenderType::View && result.child_count() > 0 {
                    (node_index, absolute_position, Point::ZERO)
                } else {
                    (host, host_position, offset)
                }
            }
            None => (host, host_position, offset),
        };

        let visited = VisitedNode {
            layout: result,
            render_unit: result.render_unit(),
            absolute_bounds: bounds.with_origin(absolute_position),
            index,
            host_index: host,
        };
        for visitor in self.visitors.iter_mut().flatten() {
            visitor.visit(&visited);
        }

        for child_index in 0..result.child_count() {
            let Some(child) = result.child_at(child_index) else {
                continue;
            };
            let child_offset = child_origin.offset(
                result.x_for_child_at(child_index),
                result.y_for_child_at(child_index),
            );
            self.visit(child, child_host, child_host_position, child_offset);
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
