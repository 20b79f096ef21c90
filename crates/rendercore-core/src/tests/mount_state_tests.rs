use super::*;
use crate::content::{ContentAllocator, MountContent, RenderType};
use crate::host::{Host, HostChild, HostView};
use crate::reducer::reduce;
use crate::LayoutResult;
use rendercore_layout::SizeConstraints;

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

struct Single {
    unit: Arc<RenderUnit>,
}

impl LayoutResult for Single {
    fn render_unit(&self) -> Option<&Arc<RenderUnit>> {
        Some(&self.unit)
    }

    fn width(&self) -> f32 {
        10.0
    }

    fn height(&self) -> f32 {
        10.0
    }

    fn child_count(&self) -> usize {
        0
    }

    fn child_at(&self, _index: usize) -> Option<&dyn LayoutResult> {
        None
    }

    fn x_for_child_at(&self, _index: usize) -> f32 {
        0.0
    }

    fn y_for_child_at(&self, _index: usize) -> f32 {
        0.0
    }
}

/// A root with leaf children, one per id, stacked vertically.
struct Column {
    children: Vec<Single>,
}

impl LayoutResult for Column {
    fn render_unit(&self) -> Option<&Arc<RenderUnit>> {
        None
    }

    fn width(&self) -> f32 {
        100.0
    }

    fn height(&self) -> f32 {
        100.0
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<&dyn LayoutResult> {
        self.children.get(index).map(|child| child as &dyn LayoutResult)
    }

    fn x_for_child_at(&self, _index: usize) -> f32 {
        0.0
    }

    fn y_for_child_at(&self, index: usize) -> f32 {
        index as f32 * 10.0
    }
}

fn leaf(id: u64) -> Single {
    Single {
        unit: Arc::new(RenderUnit::builder(RenderUnitId(id), Arc::new(LeafAllocator)).build()),
    }
}

fn tree(children: Vec<Single>) -> Arc<RenderTree> {
    let column = Column { children };
    Arc::new(reduce(&column, SizeConstraints::exact(100, 100), 1, &[]).unwrap())
}

fn mount_state() -> MountState {
    MountState::new(
        Content::new(HostView::new()),
        ContextScope::new("mount-state"),
        Rc::new(MountItemsPool::new()),
    )
    .unwrap()
}

fn root_children(state: &MountState) -> Vec<RenderUnitId> {
    state
        .root_host()
        .downcast_ref::<HostView>()
        .unwrap()
        .child_ids()
}

#[test]
fn default_config_mounts_parents_on_demand() {
    let config = MountStateConfig::default();
    assert!(config.ensure_parent_mounted);
    assert!(!config.mount_leaf_first);
    assert_eq!(config.max_parent_mount_depth, 256);
}

#[test]
fn root_content_must_be_a_host() {
    let err = MountState::new(
        Content::new(Leaf),
        ContextScope::new("mount-state"),
        Rc::new(MountItemsPool::new()),
    )
    .err();
    assert_eq!(err, Some(RenderCoreError::NotAHost { id: ROOT_HOST_ID }));
}

#[test]
fn mounting_guard_rejects_reentry() {
    let flag = Rc::new(Cell::new(false));
    let guard = MountingGuard::enter(&flag).unwrap();
    assert!(flag.get());
    assert_eq!(
        MountingGuard::enter(&flag).err().map(|err| err.to_string()),
        Some(RenderCoreError::AlreadyMounting.to_string())
    );
    drop(guard);
    assert!(!flag.get());
}

#[test]
fn mount_then_unmount_all() {
    let mut state = mount_state();
    state.mount(tree(vec![leaf(1), leaf(2)])).unwrap();
    assert_eq!(state.mount_item_count(), 3);
    assert_eq!(state.render_unit_count(), 3);
    assert_eq!(root_children(&state), vec![RenderUnitId(1), RenderUnitId(2)]);
    assert!(state.is_root_item(0));
    assert!(state.content_at(0).unwrap().ptr_eq(state.root_host()));

    state.unmount_all_items().unwrap();
    assert_eq!(state.mount_item_count(), 0);
    assert!(root_children(&state).is_empty());
    assert!(state.needs_remount());
}

#[test]
fn removed_units_are_unmounted() {
    let mut state = mount_state();
    state.mount(tree(vec![leaf(1), leaf(2)])).unwrap();
    let kept = state.content_by_id(RenderUnitId(2)).unwrap().clone();

    state.mount(tree(vec![leaf(2)])).unwrap();
    assert!(state.content_by_id(RenderUnitId(1)).is_none());
    assert!(state.content_by_id(RenderUnitId(2)).unwrap().ptr_eq(&kept));
    assert_eq!(root_children(&state), vec![RenderUnitId(2)]);
}

#[test]
fn listener_sees_each_new_tree() {
    let seen = Rc::new(Cell::new(0u32));
    let counter = seen.clone();
    let mut state = mount_state();
    state.set_render_tree_updated_listener(Some(Box::new(move |_tree| {
        counter.set(counter.get() + 1);
    })));

    let first = tree(vec![leaf(1)]);
    state.mount(first.clone()).unwrap();
    state.mount(first).unwrap();
    assert_eq!(seen.get(), 1);
    state.mount(tree(vec![leaf(1)])).unwrap();
    assert_eq!(seen.get(), 2);
}

#[test]
fn remount_flag_forces_a_pass_over_the_same_tree() {
    let seen = Rc::new(Cell::new(0u32));
    let counter = seen.clone();
    let mut state = mount_state();
    state.set_render_tree_updated_listener(Some(Box::new(move |_tree| {
        counter.set(counter.get() + 1);
    })));
    let first = tree(vec![leaf(1)]);
    state.mount(first.clone()).unwrap();
    state.set_needs_remount(true);
    state.mount(first).unwrap();
    assert_eq!(seen.get(), 2);
    assert!(!state.needs_remount());
}

/// Host that holds children but never finds them again on unmount.
#[derive(Default)]
struct ForgetfulHost {
    inner: HostView,
}

impl Host for ForgetfulHost {
    fn mount(&self, index: usize, child: HostChild) {
        self.inner.mount(index, child);
    }

    fn unmount(&self, _index: usize, _child: &HostChild) -> bool {
        false
    }

    fn move_item(&self, child: &HostChild, old_index: usize, new_index: usize) {
        self.inner.move_item(child, old_index, new_index);
    }

    fn child_at(&self, ordinal: usize) -> Option<HostChild> {
        self.inner.child_at(ordinal)
    }

    fn child_count(&self) -> usize {
        self.inner.child_count()
    }
}

impl MountContent for ForgetfulHost {
    fn as_host(&self) -> Option<&dyn Host> {
        Some(self)
    }
}

#[test]
fn unmounting_a_child_missing_from_its_host_fails_the_pass() {
    let mut state = MountState::new(
        Content::new(ForgetfulHost::default()),
        ContextScope::new("mount-state"),
        Rc::new(MountItemsPool::new()),
    )
    .unwrap();
    state.mount(tree(vec![leaf(1)])).unwrap();

    let err = state.mount(tree(vec![])).err();
    assert_eq!(
        err,
        Some(RenderCoreError::ChildNotInHost {
            host: ROOT_HOST_ID,
            child: RenderUnitId(1),
            position: 0,
        })
    );
}
