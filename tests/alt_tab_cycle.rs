//! Alt-Tab style cycling freezes the stack cursor without reordering until the cycle
//! is committed, per the frozen-stack semantics in `core::focus`.
mod common;

use mpxwm::core::bindings::BindingContext;
use mpxwm::core::data_types::Direction;
use mpxwm::core::ids::{Xid, DEFAULT_MASTER};
use mpxwm::core::xconnection::XEvent;

fn ctx() -> BindingContext {
    BindingContext { master: DEFAULT_MASTER, target: None }
}

#[test]
fn cycling_does_not_reorder_the_stack_until_committed() {
    let mut world = common::default_world();
    world.on_startup().unwrap();

    for id in [1u32, 2, 3] {
        world.handle_event(XEvent::MapRequest { id: Xid::from(id), ignore: false }).unwrap();
    }
    // mapping a window does not itself focus it in this core; drive focus explicitly
    // via the Enter handler the way a real pointer-follows-focus policy would.
    world
        .handle_event(XEvent::Enter {
            master: DEFAULT_MASTER,
            id: Xid::from(1),
            rpt: Default::default(),
            wpt: Default::default(),
        })
        .unwrap();
    world
        .handle_event(XEvent::Enter {
            master: DEFAULT_MASTER,
            id: Xid::from(2),
            rpt: Default::default(),
            wpt: Default::default(),
        })
        .unwrap();
    world
        .handle_event(XEvent::Enter {
            master: DEFAULT_MASTER,
            id: Xid::from(3),
            rpt: Default::default(),
            wpt: Default::default(),
        })
        .unwrap();

    // stack is MRU-ordered [3, 2, 1] after the Enter sequence above, with 3 at the head.
    assert_eq!(world.registry().master(DEFAULT_MASTER).unwrap().focused_window(), Some(Xid::from(3)));

    world.cycle_focus(&ctx(), Direction::Backward).unwrap();
    assert!(world.registry().master(DEFAULT_MASTER).unwrap().is_frozen());
    assert_eq!(world.registry().master(DEFAULT_MASTER).unwrap().focused_window(), Some(Xid::from(1)));

    // a second press while still held continues moving the frozen cursor rather than
    // resetting it back to the head.
    world.cycle_focus(&ctx(), Direction::Backward).unwrap();
    assert_eq!(world.registry().master(DEFAULT_MASTER).unwrap().focused_window(), Some(Xid::from(2)));

    world.commit_focus_cycle(&ctx()).unwrap();
    assert!(!world.registry().master(DEFAULT_MASTER).unwrap().is_frozen());
    assert_eq!(world.registry().master(DEFAULT_MASTER).unwrap().focused_window(), Some(Xid::from(2)));

    // a fresh focus-change after committing splices normally again.
    world
        .handle_event(XEvent::Enter {
            master: DEFAULT_MASTER,
            id: Xid::from(1),
            rpt: Default::default(),
            wpt: Default::default(),
        })
        .unwrap();
    assert_eq!(world.registry().master(DEFAULT_MASTER).unwrap().focused_window(), Some(Xid::from(1)));
}
