//! The event pump: drains the transport's event queue, falling back to a
//! periodic idle tick when it runs dry.
//!
//! This module owns no state of its own; it only sequences calls against
//! [World](crate::core::world::World)'s public surface, so the loop itself stays
//! testable without a real X connection.
use std::thread;
use std::time::Duration;

use tracing::{error, trace};

use crate::core::engine::EventKind;
use crate::core::world::World;
use crate::core::xconnection::{XConn, XEvent};
use crate::error::Result;

/// Drive `world`'s event loop until [World::quit](crate::core::world::World::quit) or
/// [World::restart](crate::core::world::World::restart) flips its shutdown flag.
///
/// Every iteration polls for one event. If one is available it is dispatched
/// immediately and the idle counter resets. If the queue is dry, batched `Periodic`
/// and `Idle` rules are flushed, the pump sleeps for
/// [Config::idle_poll_ms](crate::core::config::Config::idle_poll_ms), and once enough
/// consecutive idle ticks have accumulated to cover
/// [Config::idle_grace_ms](crate::core::config::Config::idle_grace_ms), `TrueIdle`
/// fires once per idle streak.
pub fn run<X: XConn>(world: &mut World<X>) -> Result<()> {
    let mut idle_ms_elapsed: u64 = 0;
    let mut true_idle_fired = false;

    while !world.is_shutting_down() {
        match world.poll_event() {
            Ok(Some(event)) => {
                idle_ms_elapsed = 0;
                true_idle_fired = false;
                if let Err(e) = world.handle_event(event) {
                    if world.crash_on_errors() {
                        return Err(e);
                    }
                    error!(%e, "error handling event");
                }
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                if world.crash_on_errors() {
                    return Err(e);
                }
                error!(%e, "error polling for event");
            }
        }

        world.dispatch_rule(EventKind::Periodic, None)?;
        world.flush_batched_rules(EventKind::Periodic)?;
        world.flush_batched_rules(EventKind::Idle)?;
        world.run_tile_pass()?;
        world.on_idle_tick()?;
        world.flush_conn();

        let poll_ms = world.idle_poll_ms().max(1);
        idle_ms_elapsed = idle_ms_elapsed.saturating_add(poll_ms);

        if !true_idle_fired && idle_ms_elapsed >= world.idle_grace_ms() {
            trace!(idle_ms_elapsed, "entering true idle");
            world.dispatch_rule(EventKind::TrueIdle, None)?;
            true_idle_fired = true;
        }

        thread::sleep(Duration::from_millis(poll_ms));
    }

    world.shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bindings::KeyCode;
    use crate::core::config::Config;
    use crate::core::data_types::{Point, Rect};
    use crate::core::ids::{MasterId, MonitorId, SlaveId, Xid, DEFAULT_MASTER};
    use crate::core::master::Master;
    use crate::core::monitor::Monitor;
    use crate::core::slave::Slave;
    use crate::core::xconnection::Atom;

    struct MockConn;

    impl XConn for MockConn {
        fn poll_for_event(&self) -> Result<Option<XEvent>> {
            Ok(None)
        }
        fn root(&self) -> Xid {
            Xid::from(0)
        }
        fn current_monitors(&self) -> Result<Vec<Monitor>> {
            Ok(vec![Monitor::new(MonitorId::from(1), true, Rect::new(0, 0, 800, 600))])
        }
        fn current_masters(&self) -> Result<Vec<Master>> {
            Ok(vec![Master::new(DEFAULT_MASTER, SlaveId::from(2), SlaveId::from(3), "virtual core")])
        }
        fn current_slaves(&self) -> Result<Vec<Slave>> {
            Ok(vec![])
        }
        fn map_window(&self, _id: Xid) -> Result<()> {
            Ok(())
        }
        fn unmap_window(&self, _id: Xid) -> Result<()> {
            Ok(())
        }
        fn configure_window(&self, _id: Xid, _r: Rect, _border: u32) -> Result<()> {
            Ok(())
        }
        fn raise_window(&self, _id: Xid, _sibling: Option<Xid>) -> Result<()> {
            Ok(())
        }
        fn focus_window(&self, _master: MasterId, _id: Xid) -> Result<()> {
            Ok(())
        }
        fn intern_atom(&self, _name: &str) -> Result<u32> {
            Ok(0)
        }
        fn get_atom_prop(&self, _id: Xid, _prop: Atom) -> Result<Vec<u32>> {
            Ok(vec![])
        }
        fn get_str_prop(&self, _id: Xid, _prop: Atom) -> Result<String> {
            Ok(String::new())
        }
        fn change_prop(&self, _id: Xid, _prop: Atom, _value: &[u32]) -> Result<()> {
            Ok(())
        }
        fn change_text_prop(&self, _id: Xid, _prop: Atom, _value: &str) -> Result<()> {
            Ok(())
        }
        fn send_client_message(&self, _id: Xid, _proto: Atom) -> Result<()> {
            Ok(())
        }
        fn grab_key(&self, _master: MasterId, _id: Xid, _code: KeyCode) -> Result<()> {
            Ok(())
        }
        fn ungrab_key(&self, _master: MasterId, _id: Xid, _code: KeyCode) -> Result<()> {
            Ok(())
        }
        fn grab_device(&self, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn ungrab_device(&self, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn attach_slave(&self, _slave: SlaveId, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn detach_slave(&self, _slave: SlaveId) -> Result<()> {
            Ok(())
        }
        fn create_master(&self, _name: &str) -> Result<MasterId> {
            Ok(MasterId::from(99))
        }
        fn remove_master(&self, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn warp_pointer(&self, _master: MasterId, _p: Point) -> Result<()> {
            Ok(())
        }
        fn pointer_position(&self, _master: MasterId) -> Result<Point> {
            Ok(Point::new(0, 0))
        }
        fn acquire_wm_selection(&self) -> Result<()> {
            Ok(())
        }
        fn flush(&self) {}
    }

    fn test_world() -> World<MockConn> {
        let mut config: Config<MockConn> = Config::default();
        config.idle_poll_ms = 1;
        config.idle_grace_ms = 2;
        let mut world = World::new(MockConn, config);
        world.on_startup().unwrap();
        world
    }

    #[test]
    fn loop_exits_promptly_once_quit_is_requested() {
        let mut world = test_world();
        world.quit();
        run(&mut world).unwrap();
        assert!(world.is_shutting_down());
    }

    #[test]
    fn true_idle_fires_after_the_configured_grace_period() {
        let mut world = test_world();
        world.add_rule(
            EventKind::TrueIdle,
            crate::core::engine::InsertMode::Append,
            crate::core::engine::Rule::new(
                "quit-on-true-idle",
                crate::core::engine::PassThrough::Always,
                |w: &mut World<MockConn>, _| {
                    w.quit();
                    Ok(true)
                },
            ),
        );
        run(&mut world).unwrap();
        assert!(world.is_shutting_down());
    }
}
