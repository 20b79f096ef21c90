use super::*;

#[test]
fn entries_survive_when_read_in_next_pass() {
    let mut first = LayoutCache::new();
    first.put(1, String::from("measured"));
    first.put(2, 42u32);

    let mut second = first.carry_forward();
    let hit = second.get::<String>(1).expect("carried entry");
    assert_eq!(hit.as_str(), "measured");

    let third = second.carry_forward();
    assert!(third.contains(1));
    assert!(!third.contains(2), "unused entries drop after one pass");
}

#[test]
fn wrong_type_is_a_miss() {
    let mut cache = LayoutCache::new();
    cache.put(7, 1.5f32);
    assert!(cache.get::<u32>(7).is_none());
    assert_eq!(*cache.get::<f32>(7).expect("typed hit"), 1.5);
}

#[test]
fn context_hands_back_its_cache() {
    let mut context = LayoutContext::new(3, 9, LayoutCache::new());
    context.cache().put(5, ());
    assert_eq!(context.render_state_id(), 3);
    assert_eq!(context.layout_version(), 9);
    assert_eq!(context.into_cache().written_len(), 1);
}
