use super::*;
use crate::content::{Content, ContentAllocator, ContextScope, MountContent};
use crate::host::HostView;
use crate::render_unit::{RenderUnitId, ROOT_HOST_ID};
use std::any::Any;
use std::sync::Mutex;

struct Leaf;

impl MountContent for Leaf {}

struct Allocator(RenderType);

impl ContentAllocator for Allocator {
    fn create_content(&self, _scope: &ContextScope) -> Content {
        match self.0 {
            RenderType::View => Content::new(HostView::new()),
            RenderType::Drawable => Content::new(Leaf),
        }
    }

    fn render_type(&self) -> RenderType {
        self.0
    }
}

struct Layout {
    unit: Option<Arc<RenderUnit>>,
    size: (f32, f32),
    children: Vec<(Layout, f32, f32)>,
}

impl Layout {
    fn new(unit: Option<Arc<RenderUnit>>, width: f32, height: f32) -> Self {
        Self {
            unit,
            size: (width, height),
            children: Vec::new(),
        }
    }

    fn child(mut self, child: Layout, x: f32, y: f32) -> Self {
        self.children.push((child, x, y));
        self
    }
}

impl LayoutResult for Layout {
    fn render_unit(&self) -> Option<&Arc<RenderUnit>> {
        self.unit.as_ref()
    }

    fn width(&self) -> f32 {
        self.size.0
    }

    fn height(&self) -> f32 {
        self.size.1
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<&dyn LayoutResult> {
        self.children
            .get(index)
            .map(|(child, _, _)| child as &dyn LayoutResult)
    }

    fn x_for_child_at(&self, index: usize) -> f32 {
        self.children[index].1
    }

    fn y_for_child_at(&self, index: usize) -> f32 {
        self.children[index].2
    }
}

fn view(id: u64) -> Option<Arc<RenderUnit>> {
    Some(Arc::new(
        RenderUnit::builder(RenderUnitId(id), Arc::new(Allocator(RenderType::View))).build(),
    ))
}

fn drawable(id: u64) -> Option<Arc<RenderUnit>> {
    Some(Arc::new(
        RenderUnit::builder(RenderUnitId(id), Arc::new(Allocator(RenderType::Drawable))).build(),
    ))
}

#[test]
fn hosts_reset_origin_and_groups_fold_offsets() {
    // root group
    //   host 1 @ (10, 10)
    //     group @ (5, 5)
    //       drawable 2 @ (1, 1)
    //   drawable 3 @ (0, 50)
    let layout = Layout::new(None, 100.0, 100.0)
        .child(
            Layout::new(view(1), 50.0, 40.0).child(
                Layout::new(None, 20.0, 20.0).child(Layout::new(drawable(2), 4.0, 4.0), 1.0, 1.0),
                5.0,
                5.0,
            ),
            10.0,
            10.0,
        )
        .child(Layout::new(drawable(3), 10.0, 10.0), 0.0, 50.0);

    let tree = reduce(&layout, SizeConstraints::exact(100, 100), 7, &[]).expect("reduce");

    assert_eq!(tree.mount_count(), 4);
    assert_eq!(tree.render_state_id(), 7);
    assert_eq!(tree.root().id(), ROOT_HOST_ID);

    let host = tree.node_by_id(RenderUnitId(1)).unwrap();
    assert_eq!(host.bounds(), Rect::new(10.0, 10.0, 50.0, 40.0));
    assert_eq!(host.parent(), Some(0));

    let nested = tree.node_by_id(RenderUnitId(2)).unwrap();
    assert_eq!(nested.parent(), tree.index_of(RenderUnitId(1)));
    assert_eq!(nested.bounds(), Rect::new(6.0, 6.0, 4.0, 4.0));
    assert_eq!(nested.absolute_position(), Point::new(16.0, 16.0));

    let sibling = tree.node_by_id(RenderUnitId(3)).unwrap();
    assert_eq!(sibling.parent(), Some(0));
    assert_eq!(sibling.position_in_parent(), 1);
}

#[test]
fn drawables_with_children_are_not_hosts() {
    let layout = Layout::new(None, 100.0, 100.0).child(
        Layout::new(drawable(1), 50.0, 50.0).child(Layout::new(drawable(2), 5.0, 5.0), 3.0, 4.0),
        10.0,
        20.0,
    );
    let tree = reduce(&layout, SizeConstraints::UNSPECIFIED, 1, &[]).expect("reduce");

    let child = tree.node_by_id(RenderUnitId(2)).unwrap();
    assert_eq!(child.parent(), Some(0));
    assert_eq!(child.bounds(), Rect::new(13.0, 24.0, 5.0, 5.0));
    assert_eq!(child.position_in_parent(), 1);
}

#[test]
fn parents_precede_children() {
    let layout = Layout::new(view(1), 100.0, 100.0)
        .child(
            Layout::new(view(2), 50.0, 50.0).child(Layout::new(drawable(3), 5.0, 5.0), 0.0, 0.0),
            0.0,
            0.0,
        )
        .child(Layout::new(drawable(4), 5.0, 5.0), 60.0, 0.0);
    let tree = reduce(&layout, SizeConstraints::UNSPECIFIED, 1, &[]).expect("reduce");
    for (index, node) in tree.nodes().iter().enumerate().skip(1) {
        assert!(node.parent().unwrap() < index);
    }
    assert_eq!(
        tree.nodes().iter().map(|n| n.id().raw()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
}

#[test]
fn duplicate_units_fail_reduction() {
    let layout = Layout::new(None, 10.0, 10.0)
        .child(Layout::new(drawable(1), 1.0, 1.0), 0.0, 0.0)
        .child(Layout::new(drawable(1), 1.0, 1.0), 1.0, 0.0);
    let err = reduce(&layout, SizeConstraints::UNSPECIFIED, 1, &[]).expect_err("duplicate");
    assert!(matches!(err, RenderCoreError::DuplicateRenderUnitId { .. }));
}

struct CountingExtension {
    visited: Arc<Mutex<Vec<(Option<usize>, Rect)>>>,
}

struct CountingVisitor {
    visited: Arc<Mutex<Vec<(Option<usize>, Rect)>>>,
    count: usize,
}

impl LayoutVisitor for CountingVisitor {
    fn visit(&mut self, node: &VisitedNode<'_>) {
        self.count += 1;
        self.visited
            .lock()
            .unwrap()
            .push((node.index, node.absolute_bounds));
    }

    fn finish(self: Box<Self>) -> Option<crate::extension::ExtensionInput> {
        Some(Arc::new(self.count) as Arc<dyn Any + Send + Sync>)
    }
}

impl RenderCoreExtension for CountingExtension {
    fn create_layout_visitor(&self) -> Option<Box<dyn LayoutVisitor>> {
        Some(Box::new(CountingVisitor {
            visited: self.visited.clone(),
            count: 0,
        }))
    }
}

#[test]
fn visitors_see_every_layout_node_once() {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let extension: Arc<dyn RenderCoreExtension> = Arc::new(CountingExtension {
        visited: visited.clone(),
    });
    let layout = Layout::new(None, 100.0, 100.0)
        .child(Layout::new(None, 10.0, 10.0), 0.0, 0.0)
        .child(Layout::new(drawable(1), 10.0, 10.0), 20.0, 30.0);

    let tree = reduce(&layout, SizeConstraints::UNSPECIFIED, 1, &[extension]).expect("reduce");

    let visited = visited.lock().unwrap();
    assert_eq!(visited.len(), 3);
    assert_eq!(visited[2], (Some(1), Rect::new(20.0, 30.0, 10.0, 10.0)));

    let input = tree.extension_results()[0]
        .input
        .clone()
        .expect("visitor input")
        .downcast::<usize>()
        .expect("count");
    assert_eq!(*input, 3);
}
