//! A configurable [XConn] test double shared by the end-to-end scenario tests.
//!
//! Unlike the narrow `MockConn`s colocated with each `core` module's unit tests, this
//! one is built to be driven from outside: callers seed it with whatever monitors,
//! masters, slaves and queued events a scenario needs, then inspect `calls` afterwards
//! to assert on what the `World` actually asked the transport to do.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use mpxwm::core::bindings::KeyCode;
use mpxwm::core::data_types::{Point, Rect};
use mpxwm::core::ids::{MasterId, SlaveId, Xid};
use mpxwm::core::master::Master;
use mpxwm::core::monitor::Monitor;
use mpxwm::core::slave::Slave;
use mpxwm::core::xconnection::{Atom, XConn, XEvent};
use mpxwm::Result;

/// One call the `World` made against the connection, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    MapWindow(Xid),
    UnmapWindow(Xid),
    ConfigureWindow(Xid, Rect, u32),
    RaiseWindow(Xid, Option<Xid>),
    FocusWindow(MasterId, Xid),
    SendClientMessage(Xid, String),
    GrabKey(MasterId, Xid, KeyCode),
    GrabDevice(MasterId),
    UngrabDevice(MasterId),
    AttachSlave(SlaveId, MasterId),
    DetachSlave(SlaveId),
    CreateMaster(String),
    RemoveMaster(MasterId),
    WarpPointer(MasterId, Point),
    ChangeProp(Xid, String, Vec<u32>),
    ChangeTextProp(Xid, String, String),
}

/// A fully scriptable [XConn]: fixed monitor/master/slave inventories plus a queue of
/// events to hand back one at a time from [XConn::poll_for_event].
#[derive(Default)]
pub struct MockConn {
    monitors: Vec<Monitor>,
    masters: Vec<Master>,
    slaves: Vec<Slave>,
    events: RefCell<VecDeque<XEvent>>,
    pub calls: RefCell<Vec<Call>>,
    str_props: RefCell<std::collections::HashMap<(u32, String), String>>,
}

impl MockConn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_monitors(mut self, monitors: Vec<Monitor>) -> Self {
        self.monitors = monitors;
        self
    }

    pub fn with_masters(mut self, masters: Vec<Master>) -> Self {
        self.masters = masters;
        self
    }

    pub fn with_slaves(mut self, slaves: Vec<Slave>) -> Self {
        self.slaves = slaves;
        self
    }

    pub fn push_event(&self, event: XEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn set_str_prop(&self, id: Xid, prop: Atom, value: impl Into<String>) {
        self.str_props
            .borrow_mut()
            .insert((u32::from(id), prop.as_ref().to_string()), value.into());
    }
}

impl XConn for MockConn {
    fn poll_for_event(&self) -> Result<Option<XEvent>> {
        Ok(self.events.borrow_mut().pop_front())
    }

    fn root(&self) -> Xid {
        Xid::from(0)
    }

    fn current_monitors(&self) -> Result<Vec<Monitor>> {
        if self.monitors.is_empty() {
            Ok(vec![Monitor::new(1.into(), true, Rect::new(0, 0, 1920, 1080))])
        } else {
            Ok(self.monitors.clone())
        }
    }

    fn current_masters(&self) -> Result<Vec<Master>> {
        if self.masters.is_empty() {
            Ok(vec![Master::new(
                mpxwm::core::ids::DEFAULT_MASTER,
                SlaveId::from(2),
                SlaveId::from(3),
                "virtual core",
            )])
        } else {
            Ok(self.masters.clone())
        }
    }

    fn current_slaves(&self) -> Result<Vec<Slave>> {
        Ok(self.slaves.clone())
    }

    fn map_window(&self, id: Xid) -> Result<()> {
        self.calls.borrow_mut().push(Call::MapWindow(id));
        Ok(())
    }

    fn unmap_window(&self, id: Xid) -> Result<()> {
        self.calls.borrow_mut().push(Call::UnmapWindow(id));
        Ok(())
    }

    fn configure_window(&self, id: Xid, r: Rect, border: u32) -> Result<()> {
        self.calls.borrow_mut().push(Call::ConfigureWindow(id, r, border));
        Ok(())
    }

    fn raise_window(&self, id: Xid, sibling: Option<Xid>) -> Result<()> {
        self.calls.borrow_mut().push(Call::RaiseWindow(id, sibling));
        Ok(())
    }

    fn focus_window(&self, master: MasterId, id: Xid) -> Result<()> {
        self.calls.borrow_mut().push(Call::FocusWindow(master, id));
        Ok(())
    }

    fn intern_atom(&self, _name: &str) -> Result<u32> {
        Ok(0)
    }

    fn get_atom_prop(&self, _id: Xid, _prop: Atom) -> Result<Vec<u32>> {
        Ok(vec![])
    }

    fn get_str_prop(&self, id: Xid, prop: Atom) -> Result<String> {
        Ok(self
            .str_props
            .borrow()
            .get(&(u32::from(id), prop.as_ref().to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn change_prop(&self, id: Xid, prop: Atom, value: &[u32]) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::ChangeProp(id, prop.as_ref().to_string(), value.to_vec()));
        Ok(())
    }

    fn change_text_prop(&self, id: Xid, prop: Atom, value: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::ChangeTextProp(id, prop.as_ref().to_string(), value.to_string()));
        Ok(())
    }

    fn send_client_message(&self, id: Xid, proto: Atom) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::SendClientMessage(id, proto.as_ref().to_string()));
        Ok(())
    }

    fn grab_key(&self, master: MasterId, id: Xid, code: KeyCode) -> Result<()> {
        self.calls.borrow_mut().push(Call::GrabKey(master, id, code));
        Ok(())
    }

    fn ungrab_key(&self, _master: MasterId, _id: Xid, _code: KeyCode) -> Result<()> {
        Ok(())
    }

    fn grab_device(&self, master: MasterId) -> Result<()> {
        self.calls.borrow_mut().push(Call::GrabDevice(master));
        Ok(())
    }

    fn ungrab_device(&self, master: MasterId) -> Result<()> {
        self.calls.borrow_mut().push(Call::UngrabDevice(master));
        Ok(())
    }

    fn attach_slave(&self, slave: SlaveId, master: MasterId) -> Result<()> {
        self.calls.borrow_mut().push(Call::AttachSlave(slave, master));
        Ok(())
    }

    fn detach_slave(&self, slave: SlaveId) -> Result<()> {
        self.calls.borrow_mut().push(Call::DetachSlave(slave));
        Ok(())
    }

    fn create_master(&self, name: &str) -> Result<MasterId> {
        self.calls.borrow_mut().push(Call::CreateMaster(name.to_string()));
        Ok(MasterId::from(100))
    }

    fn remove_master(&self, master: MasterId) -> Result<()> {
        self.calls.borrow_mut().push(Call::RemoveMaster(master));
        Ok(())
    }

    fn warp_pointer(&self, master: MasterId, p: Point) -> Result<()> {
        self.calls.borrow_mut().push(Call::WarpPointer(master, p));
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

pub fn default_world() -> mpxwm::World<MockConn> {
    mpxwm::World::new(MockConn::new(), mpxwm::core::config::Config::default())
}
