use super::*;
use crate::content::Content;
use crate::extension::{ExtensionState, MountExtension};

struct NothingMounted;

impl MountTarget for NothingMounted {
    fn is_mounted(&self, _id: RenderUnitId) -> bool {
        false
    }

    fn content_by_id(&self, _id: RenderUnitId) -> Option<Content> {
        None
    }

    fn root_host(&self) -> Option<Content> {
        None
    }
}

/// Holds a reference on every id in its input. When visible bounds change
/// it swaps those references for one on `#9`.
struct GateMount;

impl MountExtension for GateMount {
    type Input = Vec<RenderUnitId>;
    type State = ();

    fn name(&self) -> &'static str {
        "gate"
    }

    fn create_state(&self) -> Self::State {}

    fn can_prevent_mount(&self) -> bool {
        true
    }

    fn before_mount(
        &self,
        state: &mut ExtensionState<'_, ()>,
        input: Option<Arc<Vec<RenderUnitId>>>,
        _local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        for id in input.iter().flat_map(|ids| ids.iter()) {
            state.acquire_mount_reference(*id, true)?;
        }
        Ok(())
    }

    fn on_visible_bounds_changed(
        &self,
        state: &mut ExtensionState<'_, ()>,
        _local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        let owned: Vec<_> = state.owned_references().collect();
        for id in owned {
            state.release_mount_reference(id, false)?;
        }
        state.acquire_mount_reference(RenderUnitId(9), false)
    }
}

struct Gate;

impl RenderCoreExtension for Gate {
    fn create_mount_extension(&self) -> Option<Box<dyn AnyMountExtension>> {
        Some(GateMount.into_any())
    }
}

/// Contributes nothing at mount time.
struct Passive;

impl RenderCoreExtension for Passive {}

fn results(extension: &Arc<dyn RenderCoreExtension>, ids: &[u64]) -> Vec<ExtensionResult> {
    let input: Vec<RenderUnitId> = ids.iter().copied().map(RenderUnitId).collect();
    vec![ExtensionResult {
        extension: extension.clone(),
        input: Some(Arc::new(input)),
    }]
}

#[test]
fn reference_counts_report_zero_crossings() {
    let mut core = DelegateCore::default();
    let id = RenderUnitId(3);
    assert!(core.acquire_mount_ref(id));
    assert!(!core.acquire_mount_ref(id));
    assert_eq!(core.reference_count(id), 2);
    assert_eq!(core.release_mount_ref(id), Ok(false));
    assert_eq!(core.release_mount_ref(id), Ok(true));
    assert_eq!(
        core.release_mount_ref(id),
        Err(RenderCoreError::ReferenceCountUnderflow { id })
    );
}

#[test]
fn everything_is_mountable_without_gating_extensions() {
    let mut delegate = MountDelegate::new();
    let passive: Arc<dyn RenderCoreExtension> = Arc::new(Passive);
    delegate.register_from(&[ExtensionResult {
        extension: passive,
        input: None,
    }]);
    assert_eq!(delegate.extension_count(), 0);
    assert!(!delegate.core().is_reference_counting_enabled());
    assert!(delegate.core().maybe_lock_for_mount(RenderUnitId(42)));
}

#[test]
fn matches_compares_extension_identity_and_order() {
    let gate: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    let passive: Arc<dyn RenderCoreExtension> = Arc::new(Passive);
    let mut delegate = MountDelegate::new();
    let installed = vec![
        ExtensionResult {
            extension: gate.clone(),
            input: None,
        },
        ExtensionResult {
            extension: passive.clone(),
            input: None,
        },
    ];
    delegate.register_from(&installed);

    assert!(delegate.matches(&installed));
    assert!(!delegate.matches(&installed[..1]));
    let reordered = vec![
        ExtensionResult {
            extension: passive,
            input: None,
        },
        ExtensionResult {
            extension: gate,
            input: None,
        },
    ];
    assert!(!delegate.matches(&reordered));
    let fresh: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    assert!(!delegate.matches(&results(&fresh, &[])));
}

#[test]
fn gating_extension_locks_only_referenced_units() {
    let gate: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    let results = results(&gate, &[1, 2]);
    let mut delegate = MountDelegate::new();
    delegate.register_from(&results);
    assert_eq!(delegate.extension_names(), vec!["gate"]);

    delegate
        .before_mount(&NothingMounted, &results, None)
        .unwrap();
    let core = delegate.core();
    assert!(core.is_reference_counting_enabled());
    assert!(core.maybe_lock_for_mount(RenderUnitId(1)));
    assert!(core.maybe_lock_for_mount(RenderUnitId(2)));
    assert!(!core.maybe_lock_for_mount(RenderUnitId(3)));
    assert!(!core.has_pending_requests());
}

#[test]
fn references_taken_outside_a_pass_queue_requests() {
    let gate: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    let results = results(&gate, &[1]);
    let mut delegate = MountDelegate::new();
    delegate.register_from(&results);
    delegate
        .before_mount(&NothingMounted, &results, None)
        .unwrap();

    delegate
        .notify_visible_bounds_changed(&NothingMounted, None)
        .unwrap();
    assert_eq!(
        delegate.next_request(),
        Some(MountRequest::Unmount(RenderUnitId(1)))
    );
    assert_eq!(
        delegate.next_request(),
        Some(MountRequest::Mount(RenderUnitId(9)))
    );
    assert_eq!(delegate.next_request(), None);
}

#[test]
fn acquiring_twice_from_one_extension_fails() {
    let gate: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    let results = results(&gate, &[4, 4]);
    let mut delegate = MountDelegate::new();
    delegate.register_from(&results);
    let err = delegate
        .before_mount(&NothingMounted, &results, None)
        .unwrap_err();
    assert_eq!(
        err,
        RenderCoreError::ReferenceAlreadyOwned {
            extension: "gate",
            id: RenderUnitId(4)
        }
    );
}

#[test]
fn input_of_the_wrong_type_is_an_extension_error() {
    let gate: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    let results = vec![ExtensionResult {
        extension: gate,
        input: Some(Arc::new("not ids")),
    }];
    let mut delegate = MountDelegate::new();
    delegate.register_from(&results);
    let err = delegate
        .before_mount(&NothingMounted, &results, None)
        .unwrap_err();
    assert!(matches!(err, RenderCoreError::Extension { extension: "gate", .. }));
}

#[test]
fn unregister_all_drops_references_and_gating() {
    let gate: Arc<dyn RenderCoreExtension> = Arc::new(Gate);
    let results = results(&gate, &[1, 2]);
    let mut delegate = MountDelegate::new();
    delegate.register_from(&results);
    delegate
        .before_mount(&NothingMounted, &results, None)
        .unwrap();

    delegate.unregister_all(&NothingMounted).unwrap();
    assert_eq!(delegate.extension_count(), 0);
    assert_eq!(delegate.core().reference_count(RenderUnitId(1)), 0);
    assert!(!delegate.core().is_reference_counting_enabled());
    assert!(delegate.matches(&[]));
}

#[test]
fn nested_sections_flush_once_when_dirty() {
    let mut delegate = MountDelegate::new();
    delegate.start_notify_visible_bounds_changed_section();
    delegate.start_notify_visible_bounds_changed_section();
    assert!(!delegate.request_visible_bounds_notification());
    assert!(!delegate.end_notify_visible_bounds_changed_section());
    assert!(delegate.end_notify_visible_bounds_changed_section());

    assert!(delegate.request_visible_bounds_notification());
}

#[test]
fn clean_sections_do_not_flush() {
    let mut delegate = MountDelegate::new();
    delegate.start_notify_visible_bounds_changed_section();
    assert!(!delegate.end_notify_visible_bounds_changed_section());
}
