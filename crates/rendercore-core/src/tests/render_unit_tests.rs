use super::*;
use crate::binder::{Binder, BinderError, BinderObserver};
use crate::content::MountContent;
use std::sync::Mutex;

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

type Events = Arc<Mutex<Vec<String>>>;

struct Tracing {
    name: &'static str,
    events: Events,
}

impl Binder for Tracing {
    type Model = u32;
    type Content = Leaf;
    type BindData = String;

    fn should_update(
        &self,
        current: &u32,
        next: &u32,
        _current_layout_data: Option<&dyn LayoutData>,
        _next_layout_data: Option<&dyn LayoutData>,
    ) -> bool {
        current != next
    }

    fn bind(
        &self,
        _scope: &ContextScope,
        _content: &Leaf,
        model: &u32,
        _layout_data: Option<&dyn LayoutData>,
    ) -> Result<String, BinderError> {
        let token = format!("{}:{}", self.name, model);
        self.events.lock().unwrap().push(format!("bind {token}"));
        Ok(token)
    }

    fn unbind(
        &self,
        _scope: &ContextScope,
        _content: &Leaf,
        _model: &u32,
        _layout_data: Option<&dyn LayoutData>,
        bind_data: String,
    ) -> Result<(), BinderError> {
        self.events.lock().unwrap().push(format!("unbind {bind_data}"));
        Ok(())
    }
}

fn binder(events: &Events, name: &'static str, model: u32) -> DelegateBinder {
    DelegateBinder::new(
        model,
        Tracing {
            name,
            events: events.clone(),
        },
    )
    .with_key(BinderKey::Named(name))
}

fn unit(events: &Events, fixed: u32, optional: Option<u32>, attach: u32) -> RenderUnit {
    let mut builder = RenderUnit::builder(RenderUnitId(7), Arc::new(LeafAllocator))
        .fixed_mount_binder(binder(events, "fixed", fixed))
        .attach_binder(binder(events, "attach", attach));
    if let Some(value) = optional {
        builder = builder.optional_mount_binder(binder(events, "optional", value));
    }
    builder.build()
}

fn drain(events: &Events) -> Vec<String> {
    std::mem::take(&mut *events.lock().unwrap())
}

#[test]
fn mount_then_unmount_runs_in_reverse() {
    let events = Events::default();
    let scope = ContextScope::new("test");
    let context = BindContext::new(&scope);
    let content = Content::new(Leaf);
    let unit = unit(&events, 1, Some(2), 3);
    let mut data = BindData::new();

    unit.mount_binders(context, &content, None, &mut data).unwrap();
    unit.attach_binders(context, &content, None, &mut data).unwrap();
    assert_eq!(data.pending_len(), 3);
    unit.detach_binders(context, &content, None, &mut data).unwrap();
    unit.unmount_binders(context, &content, None, &mut data).unwrap();

    assert_eq!(
        drain(&events),
        vec![
            "bind fixed:1",
            "bind optional:2",
            "bind attach:3",
            "unbind attach:3",
            "unbind optional:2",
            "unbind fixed:1",
        ]
    );
    assert!(data.is_empty());
}

#[test]
fn update_only_touches_changed_binders() {
    let events = Events::default();
    let scope = ContextScope::new("test");
    let context = BindContext::new(&scope);
    let content = Content::new(Leaf);
    let current = unit(&events, 1, Some(2), 3);
    let next = unit(&events, 1, Some(5), 4);
    let mut data = BindData::new();

    current.mount_binders(context, &content, None, &mut data).unwrap();
    current.attach_binders(context, &content, None, &mut data).unwrap();
    drain(&events);

    RenderUnit::update_binders(&current, &next, context, &content, None, None, &mut data, true)
        .unwrap();
    assert_eq!(
        drain(&events),
        vec![
            "unbind attach:3",
            "unbind optional:2",
            "bind optional:5",
            "bind attach:4",
        ]
    );
}

#[test]
fn update_removes_and_adds_optional_binders() {
    let events = Events::default();
    let scope = ContextScope::new("test");
    let context = BindContext::new(&scope);
    let content = Content::new(Leaf);
    let with_optional = unit(&events, 1, Some(2), 3);
    let without_optional = unit(&events, 1, None, 3);
    let mut data = BindData::new();

    with_optional
        .mount_binders(context, &content, None, &mut data)
        .unwrap();
    drain(&events);

    RenderUnit::update_binders(
        &with_optional,
        &without_optional,
        context,
        &content,
        None,
        None,
        &mut data,
        false,
    )
    .unwrap();
    assert_eq!(drain(&events), vec!["unbind optional:2"]);

    RenderUnit::update_binders(
        &without_optional,
        &with_optional,
        context,
        &content,
        None,
        None,
        &mut data,
        false,
    )
    .unwrap();
    assert_eq!(drain(&events), vec!["bind optional:2"]);
}

#[test]
fn detached_items_skip_attach_binders_on_update() {
    let events = Events::default();
    let scope = ContextScope::new("test");
    let context = BindContext::new(&scope);
    let content = Content::new(Leaf);
    let current = unit(&events, 1, None, 3);
    let next = unit(&events, 1, None, 9);
    let mut data = BindData::new();

    current.mount_binders(context, &content, None, &mut data).unwrap();
    drain(&events);
    RenderUnit::update_binders(&current, &next, context, &content, None, None, &mut data, false)
        .unwrap();
    assert!(drain(&events).is_empty());
}

#[test]
fn wrong_content_type_is_reported() {
    struct Other;
    impl MountContent for Other {}

    let events = Events::default();
    let scope = ContextScope::new("test");
    let unit = unit(&events, 1, None, 3);
    let mut data = BindData::new();
    let err = unit
        .mount_binders(BindContext::new(&scope), &Content::new(Other), None, &mut data)
        .expect_err("content mismatch");
    assert!(matches!(err, RenderCoreError::ContentTypeMismatch { .. }));
}

struct SkippingObserver;

impl BinderObserver for SkippingObserver {
    fn observe_bind(&self, _id: &BinderId, _func: &mut dyn FnMut()) {}

    fn observe_unbind(&self, _id: &BinderId, func: &mut dyn FnMut()) {
        func();
    }
}

#[test]
fn strict_observer_rejects_skipped_calls() {
    let events = Events::default();
    let scope = ContextScope::new("test");
    let observer = SkippingObserver;
    let mut context = BindContext::new(&scope).with_observer(Some(&observer));
    context.strict_observer = true;
    let unit = unit(&events, 1, None, 3);
    let mut data = BindData::new();

    let err = unit
        .mount_binders(context, &Content::new(Leaf), None, &mut data)
        .expect_err("observer skipped the bind");
    assert!(matches!(
        err,
        RenderCoreError::BinderObserverContract { calls: 0, .. }
    ));

    context.strict_observer = false;
    unit.mount_binders(context, &Content::new(Leaf), None, &mut data)
        .expect("lenient observer");
    assert!(data.is_empty(), "skipped bind stores nothing");
}

#[test]
fn layout_data_equivalence_is_by_value() {
    let a: Arc<dyn LayoutData> = Arc::new(5u32);
    let b: Arc<dyn LayoutData> = Arc::new(5u32);
    let c: Arc<dyn LayoutData> = Arc::new(5i64);
    assert!(layout_data_equivalent(Some(&a), Some(&b)));
    assert!(!layout_data_equivalent(Some(&a), Some(&c)));
    assert!(!layout_data_equivalent(Some(&a), None));
    assert!(layout_data_equivalent(None, None));
}

#[test]
fn root_unit_is_shared_view() {
    let root = RenderUnit::root();
    assert_eq!(root.id(), ROOT_HOST_ID);
    assert_eq!(root.render_type(), RenderType::View);
    assert!(Arc::ptr_eq(&root, &RenderUnit::root()));
}
