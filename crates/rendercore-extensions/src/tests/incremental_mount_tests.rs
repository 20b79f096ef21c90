use super::*;

#[test]
fn overlapping_bounds_are_visible() {
    let visible = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert!(is_visible(&visible, &Rect::new(50.0, 90.0, 10.0, 20.0)));
    assert!(!is_visible(&visible, &Rect::new(0.0, 100.0, 100.0, 10.0)));
    assert!(!is_visible(&visible, &Rect::new(-20.0, 0.0, 20.0, 10.0)));
}

#[test]
fn empty_bounds_are_visible_by_origin() {
    let visible = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert!(is_visible(&visible, &Rect::new(10.0, 10.0, 0.0, 0.0)));
    assert!(!is_visible(&visible, &Rect::new(10.0, 150.0, 0.0, 0.0)));
}

#[test]
fn input_looks_up_bounds_by_id() {
    let input = IncrementalMountInput::new(vec![
        IncrementalMountNode {
            id: RenderUnitId(1),
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            host: None,
        },
        IncrementalMountNode {
            id: RenderUnitId(2),
            bounds: Rect::new(0.0, 10.0, 10.0, 10.0),
            host: None,
        },
    ]);
    assert_eq!(input.len(), 2);
    assert_eq!(
        input.bounds_of(RenderUnitId(2)),
        Some(Rect::new(0.0, 10.0, 10.0, 10.0))
    );
    assert_eq!(input.bounds_of(RenderUnitId(3)), None);
}

#[test]
fn hosts_are_listed_innermost_first() {
    let node = |id, host: Option<u64>| IncrementalMountNode {
        id: RenderUnitId(id),
        bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
        host: host.map(RenderUnitId),
    };
    let input = IncrementalMountInput::new(vec![node(1, None), node(2, Some(1)), node(3, Some(2))]);
    assert_eq!(input.host_of(RenderUnitId(1)), None);
    assert_eq!(
        input.hosts_of(RenderUnitId(3)).collect::<Vec<_>>(),
        vec![RenderUnitId(2), RenderUnitId(1)]
    );
}

#[test]
fn default_config_does_not_premount() {
    let extension = IncrementalMountExtension::new();
    assert_eq!(extension.config().premount_distance, 0.0);
    assert_eq!(extension.name(), "IncrementalMount");
}
