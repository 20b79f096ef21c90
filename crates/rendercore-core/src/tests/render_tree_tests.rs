use super::*;
use crate::content::{Content, ContentAllocator, ContextScope, MountContent};

struct Leaf;

impl MountContent for Leaf {}

struct LeafAllocator;

impl ContentAllocator for LeafAllocator {
    fn create_content(&self, _scope: &ContextScope) -> Content {
        Content::new(Leaf)
    }

    fn render_type(&self) -> RenderType {
        RenderType::Drawable
    }
}

fn unit(id: u64) -> Arc<RenderUnit> {
    Arc::new(RenderUnit::builder(RenderUnitId(id), Arc::new(LeafAllocator)).build())
}

fn root() -> RenderTreeNode {
    RenderTreeNode::new(
        None,
        RenderUnit::root(),
        None,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        Point::ZERO,
        None,
        0,
    )
}

fn leaf(id: u64, parent: usize, position: usize) -> RenderTreeNode {
    RenderTreeNode::new(
        Some(parent),
        unit(id),
        None,
        Rect::new(0.0, 10.0 * position as f32, 10.0, 10.0),
        Point::new(0.0, 10.0 * position as f32),
        None,
        position,
    )
}

#[test]
fn lookup_by_id_and_index() {
    let tree = RenderTree::new(
        vec![root(), leaf(5, 0, 0), leaf(6, 0, 1)],
        SizeConstraints::exact(100, 100),
        1,
        Vec::new(),
    )
    .expect("valid tree");

    assert_eq!(tree.mount_count(), 3);
    assert_eq!(tree.index_of(RenderUnitId(6)), Some(2));
    assert_eq!(tree.parent_id(2), Some(ROOT_HOST_ID));
    assert_eq!(tree.width(), 100.0);
    assert!(tree.node_by_id(RenderUnitId(9)).is_none());
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = RenderTree::new(
        vec![root(), leaf(5, 0, 0), leaf(5, 0, 1)],
        SizeConstraints::UNSPECIFIED,
        1,
        Vec::new(),
    )
    .expect_err("duplicate id");
    assert_eq!(
        err,
        RenderCoreError::DuplicateRenderUnitId {
            id: RenderUnitId(5),
            first_index: 1,
            second_index: 2,
        }
    );
}

#[test]
fn parents_must_precede_children() {
    let err = RenderTree::new(
        vec![root(), leaf(5, 2, 0), leaf(6, 0, 0)],
        SizeConstraints::UNSPECIFIED,
        1,
        Vec::new(),
    )
    .expect_err("forward parent link");
    assert_eq!(err, RenderCoreError::InvalidParentIndex { index: 1, parent: 2 });
}

#[test]
fn tree_must_start_with_root() {
    let err = RenderTree::new(vec![leaf(5, 0, 0)], SizeConstraints::UNSPECIFIED, 1, Vec::new())
        .expect_err("no root");
    assert_eq!(err, RenderCoreError::MissingRootNode);
}
