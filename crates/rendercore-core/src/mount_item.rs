use crate::binder::BindData;
use crate::content::Content;
use crate::extension::MountedItemRef;
use crate::host::HostChild;
use crate::render_tree::RenderTreeNode;
use crate::render_unit::{RenderUnit, RenderUnitId};
use std::fmt;
use std::sync::Arc;

/// Live pairing of a render tree node with the content mounted for it.
pub struct MountItem {
    node: Arc<RenderTreeNode>,
    content: Content,
    host_id: Option<RenderUnitId>,
    position_in_host: usize,
    is_bound: bool,
    pub(crate) bind_data: BindData,
}

impl MountItem {
    pub(crate) fn new(
        node: Arc<RenderTreeNode>,
        content: Content,
        host_id: Option<RenderUnitId>,
    ) -> Self {
        let position_in_host = node.position_in_parent();
        Self {
            node,
            content,
            host_id,
            position_in_host,
            is_bound: false,
            bind_data: BindData::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> RenderUnitId {
        self.node.id()
    }

    pub fn node(&self) -> &Arc<RenderTreeNode> {
        &self.node
    }

    pub fn render_unit(&self) -> &Arc<RenderUnit> {
        self.node.render_unit()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Id of the host this item is mounted in. `None` for the root.
    pub fn host_id(&self) -> Option<RenderUnitId> {
        self.host_id
    }

    pub fn position_in_host(&self) -> usize {
        self.position_in_host
    }

    pub fn is_bound(&self) -> bool {
        self.is_bound
    }

    pub fn bind_data(&self) -> &BindData {
        &self.bind_data
    }

    pub(crate) fn as_ref(&self) -> MountedItemRef<'_> {
        MountedItemRef {
            node: &self.node,
            content: &self.content,
        }
    }

    pub(crate) fn host_child(&self) -> HostChild {
        HostChild::new(self.id(), self.content.clone())
    }

    pub(crate) fn update(&mut self, node: Arc<RenderTreeNode>) {
        self.node = node;
    }

    pub(crate) fn set_position_in_host(&mut self, position: usize) {
        self.position_in_host = position;
    }

    pub(crate) fn set_bound(&mut self, bound: bool) {
        self.is_bound = bound;
    }
}

impl fmt::Debug for MountItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountItem")
            .field("id", &self.id())
            .field("content", &self.content)
            .field("host_id", &self.host_id)
            .field("position_in_host", &self.position_in_host)
            .field("is_bound", &self.is_bound)
            .finish()
    }
}
