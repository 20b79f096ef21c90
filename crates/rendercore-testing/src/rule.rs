use crate::content::{HostAllocator, OperationLog, RecordingHostView, TestDrawable, TestDrawableAllocator};
use crate::layout::TestLayout;
use rendercore_core::{
    reduce, Content, ContextScope, MountItemsPool, MountState, MountStateConfig, Rect,
    RenderCoreError, RenderCoreExtension, RenderTree, RenderUnit, RenderUnitId, SizeConstraints,
};
use std::rc::Rc;
use std::sync::Arc;

/// Headless harness for exercising mount passes in tests.
///
/// `MountTestRule` owns a [`MountState`] rooted in a [`RecordingHostView`].
/// Every host it hands out logs into the same [`OperationLog`], so a test
/// can assert on the exact sequence of host operations a pass performed.
pub struct MountTestRule {
    log: OperationLog,
    mount_state: MountState,
    pool: Rc<MountItemsPool>,
    hosts: Arc<HostAllocator>,
    drawables: Arc<TestDrawableAllocator>,
    extensions: Vec<Arc<dyn RenderCoreExtension>>,
    size_constraints: SizeConstraints,
    next_render_state_id: u64,
}

impl MountTestRule {
    pub fn new() -> Self {
        Self::with_config(MountStateConfig::default())
    }

    pub fn with_config(config: MountStateConfig) -> Self {
        let log = OperationLog::new();
        let pool = Rc::new(MountItemsPool::new());
        let root = Content::new(RecordingHostView::new(log.clone()));
        let mount_state =
            MountState::with_config(root, ContextScope::new("mount-test"), pool.clone(), config)
                .expect("recording host view is a host");
        Self {
            hosts: Arc::new(HostAllocator::new(log.clone())),
            drawables: Arc::new(TestDrawableAllocator::new()),
            log,
            mount_state,
            pool,
            extensions: Vec::new(),
            size_constraints: SizeConstraints::exact(100, 100),
            next_render_state_id: 1,
        }
    }

    /// Attaches `extension` to every tree reduced from now on.
    pub fn with_extension(mut self, extension: Arc<dyn RenderCoreExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn set_extensions(&mut self, extensions: Vec<Arc<dyn RenderCoreExtension>>) {
        self.extensions = extensions;
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// A host unit with no binders.
    pub fn view(&self, id: u64) -> Arc<RenderUnit> {
        Arc::new(RenderUnit::builder(RenderUnitId(id), self.hosts.clone()).build())
    }

    /// A drawable unit with no binders.
    pub fn drawable(&self, id: u64) -> Arc<RenderUnit> {
        Arc::new(RenderUnit::builder(RenderUnitId(id), self.drawables.clone()).build())
    }

    pub fn host_allocator(&self) -> &Arc<HostAllocator> {
        &self.hosts
    }

    pub fn drawable_allocator(&self) -> &Arc<TestDrawableAllocator> {
        &self.drawables
    }

    pub fn pool(&self) -> &Rc<MountItemsPool> {
        &self.pool
    }

    /// Reduces `layout` with this rule's extensions and a fresh render
    /// state id.
    pub fn reduce(&mut self, layout: &TestLayout) -> Result<Arc<RenderTree>, RenderCoreError> {
        let render_state_id = self.next_render_state_id;
        self.next_render_state_id += 1;
        reduce(layout, self.size_constraints, render_state_id, &self.extensions).map(Arc::new)
    }

    pub fn mount(&mut self, layout: &TestLayout) -> Result<Arc<RenderTree>, RenderCoreError> {
        let tree = self.reduce(layout)?;
        self.mount_state.mount(tree.clone())?;
        Ok(tree)
    }

    pub fn mount_tree(&mut self, tree: Arc<RenderTree>) -> Result<(), RenderCoreError> {
        self.mount_state.mount(tree)
    }

    pub fn mount_state(&self) -> &MountState {
        &self.mount_state
    }

    pub fn mount_state_mut(&mut self) -> &mut MountState {
        &mut self.mount_state
    }

    pub fn root(&self) -> &RecordingHostView {
        self.mount_state
            .root_host()
            .downcast_ref::<RecordingHostView>()
            .expect("root is a recording host view")
    }

    pub fn content(&self, id: u64) -> Option<&Content> {
        self.mount_state.content_by_id(RenderUnitId(id))
    }

    /// The recording host mounted for `id`, if it is mounted and a host.
    pub fn host(&self, id: u64) -> Option<&RecordingHostView> {
        self.content(id)?.downcast_ref::<RecordingHostView>()
    }

    pub fn drawable_content(&self, id: u64) -> Option<&TestDrawable> {
        self.content(id)?.downcast_ref::<TestDrawable>()
    }

    pub fn set_visible_rect(&self, rect: Option<Rect>) {
        self.root().set_visible_rect(rect);
    }
}

impl Default for MountTestRule {
    fn default() -> Self {
        Self::new()
    }
}
