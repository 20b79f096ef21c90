//! Hand-built layout results.

use rendercore_core::{
    EdgeInsets, LayoutContext, LayoutData, LayoutResult, Node, Point, RenderUnit,
    SizeConstraints,
};
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Layout result assembled by hand. Without a render unit it acts as a
/// group whose offset folds into its children.
#[derive(Clone)]
pub struct TestLayout {
    unit: Option<Arc<RenderUnit>>,
    layout_data: Option<Arc<dyn LayoutData>>,
    width: f32,
    height: f32,
    padding: EdgeInsets,
    children: Vec<(Point, TestLayout)>,
    extension_data: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>,
}

impl TestLayout {
    pub fn group(width: f32, height: f32) -> Self {
        Self {
            unit: None,
            layout_data: None,
            width,
            height,
            padding: EdgeInsets::ZERO,
            children: Vec::new(),
            extension_data: Vec::new(),
        }
    }

    pub fn unit(unit: Arc<RenderUnit>, width: f32, height: f32) -> Self {
        Self {
            unit: Some(unit),
            ..Self::group(width, height)
        }
    }

    pub fn with_layout_data(mut self, data: impl LayoutData) -> Self {
        self.layout_data = Some(Arc::new(data));
        self
    }

    pub fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_extension_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.extension_data.push((TypeId::of::<T>(), Arc::new(data)));
        self
    }

    /// Adds `child` at `(x, y)` relative to this result.
    pub fn child(mut self, x: f32, y: f32, child: TestLayout) -> Self {
        self.children.push((Point::new(x, y), child));
        self
    }
}

impl LayoutResult for TestLayout {
    fn render_unit(&self) -> Option<&Arc<RenderUnit>> {
        self.unit.as_ref()
    }

    fn layout_data(&self) -> Option<&Arc<dyn LayoutData>> {
        self.layout_data.as_ref()
    }

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn padding(&self) -> EdgeInsets {
        self.padding
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<&dyn LayoutResult> {
        self.children
            .get(index)
            .map(|(_, child)| child as &dyn LayoutResult)
    }

    fn x_for_child_at(&self, index: usize) -> f32 {
        self.children.get(index).map_or(0.0, |(offset, _)| offset.x)
    }

    fn y_for_child_at(&self, index: usize) -> f32 {
        self.children.get(index).map_or(0.0, |(offset, _)| offset.y)
    }

    fn extension_data(&self, type_id: TypeId) -> Option<&(dyn Any + Send + Sync)> {
        self.extension_data
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, data)| &**data)
    }
}

type LayoutFn = dyn Fn(&mut LayoutContext, SizeConstraints) -> TestLayout + Send + Sync;

/// Node backed by a closure, counting how often it is laid out.
pub struct TestNode {
    layout: Box<LayoutFn>,
    calls: AtomicUsize,
}

impl TestNode {
    pub fn new(
        layout: impl Fn(&mut LayoutContext, SizeConstraints) -> TestLayout + Send + Sync + 'static,
    ) -> Self {
        Self {
            layout: Box::new(layout),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always lays out to `layout`.
    pub fn fixed(layout: TestLayout) -> Self {
        Self::new(move |_, _| layout.clone())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Node for TestNode {
    fn calculate_layout(
        &self,
        context: &mut LayoutContext,
        constraints: SizeConstraints,
    ) -> Arc<dyn LayoutResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Arc::new((self.layout)(context, constraints))
    }
}
