use svg2png::{ClipboardItem, ClipboardPayload, PasteHub, Session, View};

use crate::RED_SQUARE;

fn svg_payload(markup: &str) -> ClipboardPayload {
    ClipboardPayload::new(vec![ClipboardItem::new("image/svg+xml", markup)])
}

#[test]
fn paste_while_mounted() {
    let hub = PasteHub::new();
    let view = View::new(Session::new());
    let mounted = view.mount(&hub);
    assert_eq!(hub.listener_count(), 1);

    hub.dispatch(&svg_payload(RED_SQUARE));
    assert_eq!(mounted.session().source(), RED_SQUARE);

    mounted.session_mut().convert().unwrap();
    assert!(view.session().image().is_some());
}

#[test]
fn unmount_removes_listener() {
    let hub = PasteHub::new();
    let view = View::new(Session::new());
    let view = view.mount(&hub).unmount();
    assert_eq!(hub.listener_count(), 0);

    assert_eq!(hub.dispatch(&svg_payload(RED_SQUARE)), 0);
    assert_eq!(view.session().source(), "");
}

#[test]
fn drop_unmounts() {
    let hub = PasteHub::new();
    let view = View::new(Session::new());
    {
        let _mounted = view.mount(&hub);
        assert_eq!(hub.listener_count(), 1);
    }
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn views_are_independent() {
    let hub = PasteHub::new();
    let view1 = View::new(Session::new());
    let view2 = View::new(Session::new());
    let _mounted1 = view1.mount(&hub);
    let mounted2 = view2.mount(&hub);

    assert_eq!(hub.dispatch(&svg_payload("<svg id='a'/>")), 2);
    assert_eq!(view1.session().source(), "<svg id='a'/>");
    assert_eq!(view2.session().source(), "<svg id='a'/>");

    mounted2.unmount();
    assert_eq!(hub.dispatch(&svg_payload("<svg id='b'/>")), 1);
    assert_eq!(view1.session().source(), "<svg id='b'/>");
    assert_eq!(view2.session().source(), "<svg id='a'/>");
}

#[test]
fn remount_does_not_double_handle() {
    let hub = PasteHub::new();
    let view = View::new(Session::new());
    drop(view.mount(&hub));
    let _mounted = view.mount(&hub);
    assert_eq!(hub.dispatch(&svg_payload(RED_SQUARE)), 1);
}

#[test]
fn paste_while_session_is_borrowed() {
    let hub = PasteHub::new();
    let view = View::new(Session::new());
    let _mounted = view.mount(&hub);

    {
        let _session = view.session_mut();
        assert_eq!(hub.dispatch(&svg_payload(RED_SQUARE)), 1);
    }

    assert_eq!(view.session().source(), "");
}
