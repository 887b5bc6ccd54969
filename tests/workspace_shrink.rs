//! Shrinking the workspace count merges every displaced window onto the last
//! surviving workspace instead of leaving them orphaned.
mod common;

use mpxwm::core::ids::Xid;
use mpxwm::core::layout::{monocle, Layout, LayoutArgs};
use mpxwm::core::xconnection::XEvent;

#[test]
fn shrinking_workspaces_merges_windows_into_the_last_survivor() {
    let mut config = mpxwm::core::config::Config::default();
    config.workspaces(vec!["1", "2", "3"]);
    let mut world = mpxwm::World::new(common::MockConn::new(), config);
    world.on_startup().unwrap();

    world.handle_event(XEvent::MapRequest { id: Xid::from(1), ignore: false }).unwrap();
    world.registry_mut().move_to_workspace(Xid::from(1), Some(2)).unwrap();

    assert_eq!(world.registry().workspaces().len(), 3);
    assert_eq!(world.registry().window(Xid::from(1)).unwrap().workspace(), Some(2));

    world
        .registry_mut()
        .set_workspace_count(2, vec![Layout::new("[]=", monocle, LayoutArgs::default())]);

    assert_eq!(world.registry().workspaces().len(), 2);
    assert_eq!(world.registry().window(Xid::from(1)).unwrap().workspace(), Some(1));
    assert!(world.registry().workspace(1).unwrap().window_ids().any(|id| id == Xid::from(1)));
}

#[test]
fn shrinking_workspaces_never_drops_below_one() {
    let mut world = common::default_world();
    world.on_startup().unwrap();

    world
        .registry_mut()
        .set_workspace_count(0, vec![Layout::new("[]=", monocle, LayoutArgs::default())]);

    assert!(!world.registry().workspaces().is_empty());
}
