use super::*;
use crate::scheduler::ChannelUiScheduler;
use rendercore_layout::SizeConstraints;
use rendercore_testing::{TestLayout, TestNode};
use std::sync::atomic::AtomicUsize;
use std::thread;

/// Resolves a base height plus queued increments into a single group.
struct Heights {
    resolves: Arc<AtomicUsize>,
    layouts: Arc<AtomicUsize>,
}

impl Resolver for Heights {
    type Tree = f32;
    type Update = f32;

    fn resolve(&self, tree: &f32, updates: &[f32]) -> Arc<dyn Node> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        let height = tree + updates.iter().sum::<f32>();
        let layouts = self.layouts.clone();
        Arc::new(TestNode::new(move |_, constraints| {
            layouts.fetch_add(1, Ordering::SeqCst);
            TestLayout::group(constraints.max_width() as f32, height)
        }))
    }
}

#[derive(Default)]
struct RecordingDelegate {
    commits: Mutex<Vec<(u64, bool)>>,
    ui_heights: Mutex<Vec<f32>>,
}

impl RenderStateDelegate for RecordingDelegate {
    fn commit(
        &self,
        layout_version: u64,
        previous: Option<&Arc<RenderTree>>,
        _next: &Arc<RenderTree>,
    ) {
        self.commits
            .lock()
            .unwrap()
            .push((layout_version, previous.is_some()));
    }

    fn commit_to_ui(&self, tree: &Arc<RenderTree>) {
        self.ui_heights.lock().unwrap().push(tree.height());
    }
}

struct Fixture {
    state: RenderState<Heights>,
    delegate: Arc<RecordingDelegate>,
    scheduler: Arc<ChannelUiScheduler>,
    resolves: Arc<AtomicUsize>,
    layouts: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
    let resolves = Arc::new(AtomicUsize::new(0));
    let layouts = Arc::new(AtomicUsize::new(0));
    let delegate = Arc::new(RecordingDelegate::default());
    let scheduler = Arc::new(ChannelUiScheduler::new());
    let state = RenderState::new(
        Heights {
            resolves: resolves.clone(),
            layouts: layouts.clone(),
        },
        delegate.clone(),
        scheduler.clone(),
    );
    Fixture {
        state,
        delegate,
        scheduler,
        resolves,
        layouts,
    }
}

#[test]
fn setting_a_tree_without_constraints_only_resolves() {
    let f = fixture();
    f.state.set_tree(30.0).unwrap();

    assert_eq!(f.state.committed_resolve_version(), Some(0));
    assert_eq!(f.state.committed_layout_version(), None);
    assert!(f.state.committed_render_tree().is_none());
    assert_eq!(f.layouts.load(Ordering::SeqCst), 0);
}

#[test]
fn commits_on_the_ui_thread_are_promoted_immediately() {
    let f = fixture();
    f.state.set_tree(30.0).unwrap();
    f.state
        .set_size_constraints(SizeConstraints::exact(100, 100))
        .unwrap();

    let tree = f.state.committed_render_tree().unwrap();
    assert_eq!(tree.height(), 30.0);
    assert_eq!(tree.render_state_id(), f.state.id());
    assert_eq!(tree.generation(), 0);
    assert_eq!(*f.delegate.commits.lock().unwrap(), vec![(0, false)]);
    assert_eq!(*f.delegate.ui_heights.lock().unwrap(), vec![30.0]);
    assert!(Arc::ptr_eq(&f.state.ui_render_tree().unwrap(), &tree));
}

#[test]
fn state_updates_fold_into_the_next_resolve() {
    let f = fixture();
    f.state.enqueue_state_update(5.0).unwrap();
    assert_eq!(f.state.pending_update_count(), 1);
    assert_eq!(f.resolves.load(Ordering::SeqCst), 0);

    f.state
        .set_size_constraints(SizeConstraints::exact(100, 100))
        .unwrap();
    f.state.set_tree(30.0).unwrap();
    assert_eq!(f.state.pending_update_count(), 0);
    assert_eq!(f.state.committed_render_tree().unwrap().height(), 35.0);

    f.state.enqueue_state_update(10.0).unwrap();
    // Consumed updates are not applied twice.
    assert_eq!(f.state.committed_render_tree().unwrap().height(), 40.0);
    assert_eq!(f.state.committed_resolve_version(), Some(1));
    assert_eq!(f.state.committed_layout_version(), Some(1));
    assert_eq!(f.state.committed_render_tree().unwrap().generation(), 1);
}

#[test]
fn unchanged_constraints_skip_layout() {
    let f = fixture();
    f.state.set_tree(30.0).unwrap();
    f.state
        .set_size_constraints(SizeConstraints::exact(100, 100))
        .unwrap();
    f.state
        .set_size_constraints(SizeConstraints::exact(100, 100))
        .unwrap();
    assert_eq!(f.layouts.load(Ordering::SeqCst), 1);

    f.state
        .set_size_constraints(SizeConstraints::exact(200, 100))
        .unwrap();
    assert_eq!(f.layouts.load(Ordering::SeqCst), 2);
    assert_eq!(f.state.committed_render_tree().unwrap().width(), 200.0);
    assert_eq!(*f.delegate.commits.lock().unwrap(), vec![(0, false), (1, true)]);
}

#[test]
fn measure_lays_out_on_the_calling_thread() {
    let f = fixture();
    assert_eq!(
        f.state.measure(SizeConstraints::exact(100, 100)),
        Err(RenderStateError::NoTree)
    );

    f.state.set_tree(25.0).unwrap();
    let size = f.state.measure(SizeConstraints::exact(80, 100)).unwrap();
    assert_eq!(size, Size::new(80.0, 25.0));
    assert_eq!(f.state.size_constraints(), Some(SizeConstraints::exact(80, 100)));
}

#[test]
fn commits_off_the_ui_thread_are_posted() {
    let f = fixture();
    let worker = {
        let state = f.state.clone();
        thread::spawn(move || {
            state.set_tree(30.0).unwrap();
            state
                .set_size_constraints(SizeConstraints::exact(100, 100))
                .unwrap();
        })
    };
    worker.join().unwrap();

    assert!(f.state.committed_render_tree().is_some());
    assert!(f.state.ui_render_tree().is_none());
    assert!(f.scheduler.has_pending());

    assert_eq!(f.scheduler.run_pending(), 1);
    assert_eq!(*f.delegate.ui_heights.lock().unwrap(), vec![30.0]);
    assert!(f.state.ui_render_tree().is_some());
}

#[test]
fn stale_layouts_are_discarded() {
    let f = fixture();
    f.state.set_tree(30.0).unwrap();
    f.state
        .set_size_constraints(SizeConstraints::exact(100, 100))
        .unwrap();
    f.state
        .set_size_constraints(SizeConstraints::exact(200, 100))
        .unwrap();
    let newest = f.state.committed_render_tree().unwrap();

    // Layout 0 finishing after layout 1 must not replace it.
    f.state.commit_layout(
        0,
        LayoutOutput {
            tree: newest.clone(),
            cache: LayoutCache::new(),
        },
    );
    assert_eq!(f.state.committed_layout_version(), Some(1));
    assert_eq!(f.delegate.commits.lock().unwrap().len(), 2);
}

#[test]
fn setting_an_equal_tree_resolves_again() {
    let f = fixture();
    f.state.set_tree(30.0).unwrap();
    f.state.set_tree(30.0).unwrap();

    assert_eq!(f.resolves.load(Ordering::SeqCst), 2);
    assert_eq!(f.state.committed_resolve_version(), Some(1));
}

#[test]
fn stale_resolves_are_discarded() {
    let f = fixture();
    f.state.set_tree(30.0).unwrap();
    f.state.set_tree(40.0).unwrap();
    assert_eq!(f.state.committed_resolve_version(), Some(1));

    let stale: Arc<dyn Node> = Arc::new(TestNode::fixed(TestLayout::group(10.0, 10.0)));
    f.state.commit_resolve(0, 0, stale);
    assert_eq!(f.state.committed_resolve_version(), Some(1));

    f.state
        .set_size_constraints(SizeConstraints::exact(100, 100))
        .unwrap();
    assert_eq!(f.state.committed_render_tree().unwrap().height(), 40.0);
}

#[test]
fn layout_cache_carries_forward_between_passes() {
    let delegate = Arc::new(RecordingDelegate::default());
    struct Counting;
    impl Resolver for Counting {
        type Tree = ();
        type Update = ();

        fn resolve(&self, _tree: &(), _updates: &[()]) -> Arc<dyn Node> {
            Arc::new(TestNode::new(|context, _| {
                let passes = context.cache().get::<u32>(7).map_or(0, |n| *n) + 1;
                context.cache().put(7, passes);
                TestLayout::group(100.0, passes as f32)
            }))
        }
    }
    let state = RenderState::new(Counting, delegate, Arc::new(ChannelUiScheduler::new()));
    state.set_tree(()).unwrap();

    for (width, expected) in [(100, 1.0), (110, 2.0), (120, 3.0)] {
        state
            .set_size_constraints(SizeConstraints::exact(width, 100))
            .unwrap();
        assert_eq!(state.committed_render_tree().unwrap().height(), expected);
    }
}
