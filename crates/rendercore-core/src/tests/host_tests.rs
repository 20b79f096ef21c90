use super::*;

struct Leaf;

impl MountContent for Leaf {}

fn child(id: u64) -> HostChild {
    HostChild::new(RenderUnitId(id), Content::new(Leaf))
}

#[test]
fn swap_through_scrap() {
    let host = HostView::new();
    let a = child(1);
    let b = child(2);
    host.mount(0, a.clone());
    host.mount(1, b.clone());

    host.move_item(&b, 1, 0);
    assert_eq!(host.child_count(), 2, "a is parked in scrap");
    assert_eq!(host.get(0), Some(b.clone()));

    host.move_item(&a, 0, 1);
    assert_eq!(host.child_ids(), vec![RenderUnitId(2), RenderUnitId(1)]);
    assert_eq!(host.children.borrow().scrap_len(), 0);
}

#[test]
fn unmount_finds_scrapped_child() {
    let host = HostView::new();
    let a = child(1);
    let b = child(2);
    host.mount(0, a.clone());
    host.mount(1, b.clone());
    host.move_item(&b, 1, 0);

    assert!(host.unmount(0, &a));
    assert!(host.unmount(0, &b));
    assert_eq!(host.child_count(), 0);
}

#[test]
fn unmount_of_absent_child_is_rejected() {
    let host = HostView::new();
    host.mount(0, child(1));
    assert!(!host.unmount(0, &child(1)), "different content at that index");
    assert!(!host.unmount(3, &child(1)));
    assert_eq!(host.child_count(), 1);
}

#[test]
fn child_at_enumerates_live_then_scrap() {
    let host = HostView::new();
    host.mount(4, child(1));
    host.mount(2, child(2));
    let seen: Vec<_> = (0..host.child_count())
        .filter_map(|i| host.child_at(i))
        .map(|c| c.id)
        .collect();
    assert_eq!(seen, vec![RenderUnitId(2), RenderUnitId(1)]);
}
