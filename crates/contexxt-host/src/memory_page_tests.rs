use super::*;

fn image(src: &str) -> ElementSnapshot {
    ElementSnapshot {
        tag_name: "img".to_string(),
        src: Some(src.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_query_media_in_document_order() {
    let page = MemoryPage::new();
    let body = page.body();
    let div = page.insert(
        body,
        ElementSnapshot {
            tag_name: "div".to_string(),
            ..Default::default()
        },
        Rect::default(),
    );
    let first = page.insert(div, image("a.png"), Rect::default());
    let second = page.insert_video("b.mp4", Rect::default());

    assert_eq!(page.query_media(), vec![first, second]);
}

#[test]
fn test_query_media_in_detached_subtree() {
    let page = MemoryPage::new();
    let body = page.body();
    let div = page.insert(
        body,
        ElementSnapshot {
            tag_name: "section".to_string(),
            ..Default::default()
        },
        Rect::default(),
    );
    let img = page.insert(div, image("a.png"), Rect::default());

    page.remove(div);
    assert!(!page.is_connected(img));
    assert_eq!(page.query_media_in(div), vec![img]);
    assert_eq!(page.query_media_in(img), vec![img]);
    assert!(page.query_media().is_empty());
}

#[test]
fn test_mutations_only_recorded_while_observing() {
    let page = MemoryPage::new();
    page.insert_image("a.png", None, Rect::default());
    assert!(page.take_mutations().is_empty());

    page.observe_mutations(page.body());
    let img = page.insert_image("b.png", None, Rect::default());
    page.remove(img);

    let records = page.take_mutations();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].added, vec![img]);
    assert_eq!(records[1].removed, vec![img]);

    page.disconnect_mutations();
    page.insert_image("c.png", None, Rect::default());
    assert!(page.take_mutations().is_empty());
}

#[test]
fn test_client_rect_follows_scroll() {
    let page = MemoryPage::new();
    let img = page.insert_image("a.png", None, Rect::new(100.0, 900.0, 50.0, 40.0));
    page.scroll_to(0.0, 500.0);

    assert_eq!(page.bounding_client_rect(img), Rect::new(100.0, 400.0, 50.0, 40.0));
}

#[test]
fn test_detached_rect_is_empty() {
    let page = MemoryPage::new();
    let img = page.insert_image("a.png", None, Rect::new(0.0, 0.0, 50.0, 40.0));
    page.remove(img);
    assert!(page.bounding_client_rect(img).is_empty());
}

#[test]
fn test_resize_entries_scoped_to_observed_targets() {
    let page = MemoryPage::new();
    let a = page.insert_image("a.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = page.insert_image("b.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));
    page.observe_resize(a);

    page.set_rect(a, Rect::new(0.0, 0.0, 20.0, 10.0));
    page.set_rect(b, Rect::new(0.0, 0.0, 20.0, 10.0));
    // Moving without resizing is not a resize.
    page.set_rect(a, Rect::new(5.0, 5.0, 20.0, 10.0));

    let entries = page.take_resizes();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].target, a);

    page.unobserve_resize(a);
    assert!(page.resize_targets().is_empty());
}

#[test]
fn test_container_lifecycle() {
    let page = MemoryPage::new();
    let container = page.create_container("contexxt-overlay", ":host {}");
    assert!(!page.is_container_attached(container));

    page.attach_container(container);
    assert!(page.is_container_attached(container));
    assert_eq!(page.attached_containers(), vec![container]);
    assert_eq!(page.ancestors(container), vec![page.body(), NodeId(1)]);

    page.set_markup(container, "<div>hi</div>");
    page.set_class(container, "active", true);
    assert_eq!(page.container_markup(container).as_deref(), Some("<div>hi</div>"));
    assert!(page.container_has_class(container, "active"));

    page.set_class(container, "active", false);
    assert!(!page.container_has_class(container, "active"));

    page.detach_container(container);
    assert!(page.attached_containers().is_empty());
}

#[test]
fn test_pointer_down_listener_count() {
    let page = MemoryPage::new();
    page.listen_pointer_down();
    assert_eq!(page.pointer_down_listeners(), 1);
    page.unlisten_pointer_down();
    page.unlisten_pointer_down();
    assert_eq!(page.pointer_down_listeners(), 0);
}
