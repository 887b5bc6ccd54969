//! A `_NET_CLOSE_WINDOW` client message is translated into a `WM_DELETE_WINDOW`
//! protocol message sent to the target, rather than the window being torn down
//! directly — closing is always a request the client itself can refuse.
mod common;

use common::Call;
use mpxwm::core::ids::Xid;
use mpxwm::core::xconnection::XEvent;

#[test]
fn close_window_client_message_sends_wm_delete_window() {
    let mut world = common::default_world();
    world.on_startup().unwrap();
    world.handle_event(XEvent::MapRequest { id: Xid::from(5), ignore: false }).unwrap();

    world
        .handle_event(XEvent::ClientMessage {
            id: Xid::from(5),
            dtype: "_NET_CLOSE_WINDOW".into(),
            data: vec![],
        })
        .unwrap();

    let calls = world.conn().calls.borrow();
    assert!(calls
        .iter()
        .any(|c| matches!(c, Call::SendClientMessage(id, proto) if *id == Xid::from(5) && proto == "WM_DELETE_WINDOW")));
    // the window is not removed from the registry purely by asking it to close; it
    // stays managed until the client actually destroys itself.
    assert!(world.registry().window(Xid::from(5)).is_some());
}

#[test]
fn source_indication_outside_the_allowed_mask_is_dropped() {
    let mut config = mpxwm::core::config::Config::default();
    config.src_indication_mask = 0b0010;
    let mut world = mpxwm::World::new(common::MockConn::new(), config);
    world.on_startup().unwrap();
    world.handle_event(XEvent::MapRequest { id: Xid::from(5), ignore: false }).unwrap();

    world
        .handle_event(XEvent::ClientMessage {
            id: Xid::from(5),
            dtype: "_NET_CLOSE_WINDOW".into(),
            data: vec![1usize << 28],
        })
        .unwrap();

    let calls = world.conn().calls.borrow();
    assert!(!calls.iter().any(|c| matches!(c, Call::SendClientMessage(..))));
}

#[test]
fn kill_focused_binding_also_requests_delete_rather_than_destroying() {
    use mpxwm::core::bindings::BindingContext;
    use mpxwm::core::ids::DEFAULT_MASTER;

    let mut world = common::default_world();
    world.on_startup().unwrap();
    world.handle_event(XEvent::MapRequest { id: Xid::from(5), ignore: false }).unwrap();

    world
        .handle_event(XEvent::Enter {
            master: DEFAULT_MASTER,
            id: Xid::from(5),
            rpt: Default::default(),
            wpt: Default::default(),
        })
        .unwrap();

    world.kill_focused(&BindingContext { master: DEFAULT_MASTER, target: None }).unwrap();

    let calls = world.conn().calls.borrow();
    assert!(calls
        .iter()
        .any(|c| matches!(c, Call::SendClientMessage(id, proto) if *id == Xid::from(5) && proto == "WM_DELETE_WINDOW")));
}
