//! The entity registry: the single authority on which windows, masters, slaves,
//! workspaces and monitors currently exist, and the only place cross-entity
//! invariants (window <-> workspace, slave <-> master, ...) are maintained together.
//!
//! Every cross-entity reference elsewhere in the core is by id; resolving an id to
//! live data always goes through here.
use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::core::ids::{MasterId, MonitorId, SlaveId, Xid, DEFAULT_MASTER};
use crate::core::master::Master;
use crate::core::monitor::Monitor;
use crate::core::slave::{Slave, SlaveKind};
use crate::core::window::Window;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};

/// The entity registry. Owns every live [Window], [Master], [Slave], [Workspace] and
/// [Monitor], keyed by their stable numeric ids.
#[derive(Debug, Default)]
pub struct Registry {
    windows: HashMap<Xid, Window>,
    masters: HashMap<MasterId, Master>,
    slaves: HashMap<SlaveId, Slave>,
    workspaces: Vec<Workspace>,
    monitors: HashMap<MonitorId, Monitor>,
    next_focus_tick: u64,
}

impl Registry {
    /// Construct an empty [Registry] with the given number of workspaces, each using
    /// `layouts` as its initial layout list.
    pub fn new(workspace_names: &[String], layouts: Vec<crate::core::layout::Layout>) -> Self {
        let workspaces = workspace_names
            .iter()
            .enumerate()
            .map(|(i, name)| Workspace::new(i, name.clone(), layouts.clone()))
            .collect();

        Self {
            windows: HashMap::new(),
            masters: HashMap::new(),
            slaves: HashMap::new(),
            workspaces,
            monitors: HashMap::new(),
            next_focus_tick: 1,
        }
    }

    // ---- windows ---------------------------------------------------------

    /// Register a newly mapped window. Fails if `id` is already registered.
    pub fn insert_window(&mut self, window: Window) -> Result<()> {
        let id = window.id();
        if self.windows.contains_key(&id) {
            return Err(Error::DuplicateId {
                kind: "window",
                id: *id,
            });
        }
        trace!(window = *id, "registering window");
        self.windows.insert(id, window);
        Ok(())
    }

    /// Remove a window from the registry, detaching it from its workspace if it had
    /// one. Idempotent: removing an unknown id is not an error.
    pub fn remove_window(&mut self, id: Xid) -> Option<Window> {
        let window = self.windows.remove(&id)?;
        if let Some(wix) = window.workspace() {
            if let Some(ws) = self.workspaces.get_mut(wix) {
                ws.remove_window(id);
            }
        }
        for master in self.masters.values_mut() {
            master.window_stack.remove_element(&id);
        }
        debug!(window = *id, "removed window");
        Some(window)
    }

    /// Look up a window by id.
    pub fn window(&self, id: Xid) -> Option<&Window> {
        self.windows.get(&id)
    }

    /// Look up a window by id, mutably.
    pub fn window_mut(&mut self, id: Xid) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    /// Every registered window id, in arbitrary order.
    pub fn window_ids(&self) -> impl Iterator<Item = Xid> + '_ {
        self.windows.keys().copied()
    }

    /// The first window satisfying `pred`.
    pub fn find_window(&self, pred: impl Fn(&Window) -> bool) -> Option<&Window> {
        self.windows.values().find(|w| pred(w))
    }

    /// Move `id` to `wix` (or off of any workspace if `None`), keeping the window's own
    /// pointer and the source/destination workspace stacks consistent.
    ///
    /// This is the only sanctioned way to change a window's workspace membership; see
    /// the invariant note on [crate::core::window::Window::set_workspace].
    pub fn move_to_workspace(&mut self, id: Xid, wix: Option<usize>) -> Result<()> {
        if let Some(wix) = wix {
            if self.workspaces.get(wix).is_none() {
                return Err(Error::UnknownId {
                    kind: "workspace",
                    id: wix as u32,
                });
            }
        }

        let old_wix = match self.windows.get(&id) {
            Some(w) => w.workspace(),
            None => {
                return Err(Error::UnknownId {
                    kind: "window",
                    id: *id,
                })
            }
        };

        if old_wix == wix {
            return Ok(());
        }

        if let Some(old) = old_wix {
            if let Some(ws) = self.workspaces.get_mut(old) {
                ws.remove_window(id);
            }
        }
        if let Some(new) = wix {
            if let Some(ws) = self.workspaces.get_mut(new) {
                ws.push_window(id);
            }
        }

        self.windows.get_mut(&id).unwrap().set_workspace(wix);
        Ok(())
    }

    // ---- masters -----------------------------------------------------------

    /// Register a newly created MPX master.
    pub fn insert_master(&mut self, master: Master) -> Result<()> {
        let id = master.id();
        if self.masters.contains_key(&id) {
            return Err(Error::DuplicateId {
                kind: "master",
                id: *id,
            });
        }
        self.masters.insert(id, master);
        Ok(())
    }

    /// Remove a master, reattaching every slave it owned to the default master
    /// rather than leaving them floating.
    pub fn remove_master(&mut self, id: MasterId) -> Option<Master> {
        let master = self.masters.remove(&id)?;
        for slave in self.slaves.values_mut() {
            if slave.attached_master() == Some(id) {
                if self.masters.contains_key(&DEFAULT_MASTER) {
                    slave.attach(DEFAULT_MASTER);
                } else {
                    slave.detach();
                }
            }
        }
        debug!(master = *id, "removed master");
        Some(master)
    }

    pub fn master(&self, id: MasterId) -> Option<&Master> {
        self.masters.get(&id)
    }

    pub fn master_mut(&mut self, id: MasterId) -> Option<&mut Master> {
        self.masters.get_mut(&id)
    }

    pub fn master_ids(&self) -> impl Iterator<Item = MasterId> + '_ {
        self.masters.keys().copied()
    }

    pub fn masters(&self) -> impl Iterator<Item = &Master> {
        self.masters.values()
    }

    // ---- slaves --------------------------------------------------------------

    /// Register a newly seen slave device, attaching it to the default master unless
    /// it is a floating XTEST device.
    pub fn insert_slave(&mut self, mut slave: Slave) -> Result<()> {
        let id = slave.id();
        if self.slaves.contains_key(&id) {
            return Err(Error::DuplicateId {
                kind: "slave",
                id: *id,
            });
        }
        if !slave.is_test_device() && self.masters.contains_key(&DEFAULT_MASTER) {
            slave.attach(DEFAULT_MASTER);
        }
        self.slaves.insert(id, slave);
        Ok(())
    }

    pub fn remove_slave(&mut self, id: SlaveId) -> Option<Slave> {
        self.slaves.remove(&id)
    }

    pub fn slave(&self, id: SlaveId) -> Option<&Slave> {
        self.slaves.get(&id)
    }

    pub fn slave_mut(&mut self, id: SlaveId) -> Option<&mut Slave> {
        self.slaves.get_mut(&id)
    }

    /// Every slave currently attached to `master`.
    pub fn slaves_of(&self, master: MasterId) -> impl Iterator<Item = &Slave> {
        self.slaves.values().filter(move |s| s.attached_master() == Some(master))
    }

    /// Find the keyboard or pointer slave attached to `master`.
    pub fn device_of(&self, master: MasterId, kind: SlaveKind) -> Option<&Slave> {
        self.slaves_of(master).find(|s| s.kind() == kind)
    }

    // ---- workspaces -----------------------------------------------------------

    pub fn workspace(&self, wix: usize) -> Option<&Workspace> {
        self.workspaces.get(wix)
    }

    pub fn workspace_mut(&mut self, wix: usize) -> Option<&mut Workspace> {
        self.workspaces.get_mut(wix)
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Grow or shrink the workspace count, merging displaced windows into the last
    /// remaining workspace when shrinking.
    pub fn set_workspace_count(&mut self, n: usize, layouts: Vec<crate::core::layout::Layout>) {
        if n == 0 {
            warn!("refusing to shrink workspace count to zero");
            return;
        }
        match n.cmp(&self.workspaces.len()) {
            std::cmp::Ordering::Greater => {
                for i in self.workspaces.len()..n {
                    self.workspaces
                        .push(Workspace::new(i, format!("{}", i + 1), layouts.clone()));
                }
            }
            std::cmp::Ordering::Less => {
                let surviving_ids: Vec<Xid> = self.workspaces[n..]
                    .iter()
                    .flat_map(|ws| ws.window_ids())
                    .collect();
                self.workspaces.truncate(n);
                let last = n - 1;
                for id in surviving_ids {
                    if let Some(w) = self.windows.get_mut(&id) {
                        w.set_workspace(Some(last));
                    }
                    self.workspaces[last].push_window(id);
                }
                for master in self.masters.values_mut() {
                    if master.active_workspace() >= n {
                        master.set_active_workspace(last);
                    }
                }
            }
            std::cmp::Ordering::Equal => {}
        }
    }

    // ---- monitors -----------------------------------------------------------

    pub fn insert_monitor(&mut self, monitor: Monitor) -> Result<()> {
        let id = monitor.id();
        if self.monitors.contains_key(&id) {
            return Err(Error::DuplicateId {
                kind: "monitor",
                id: *id,
            });
        }
        self.monitors.insert(id, monitor);
        Ok(())
    }

    /// Remove a monitor, unassigning its workspace: a workspace whose monitor is
    /// removed keeps its windows but becomes unassigned.
    pub fn remove_monitor(&mut self, id: MonitorId) -> Option<Monitor> {
        let monitor = self.monitors.remove(&id)?;
        for ws in self.workspaces.iter_mut() {
            if ws.monitor() == Some(id) {
                ws.set_monitor(None);
            }
        }
        Some(monitor)
    }

    pub fn monitor(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.get(&id)
    }

    pub fn monitor_mut(&mut self, id: MonitorId) -> Option<&mut Monitor> {
        self.monitors.get_mut(&id)
    }

    pub fn monitors(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.values()
    }

    /// Assign `wix` to `monitor`, clearing any previous workspace<->monitor pairing on
    /// either side so the relationship stays one-to-one.
    pub fn assign_workspace_to_monitor(&mut self, wix: usize, monitor: MonitorId) -> Result<()> {
        if !self.workspaces.get(wix).is_some() {
            return Err(Error::UnknownId {
                kind: "workspace",
                id: wix as u32,
            });
        }
        if !self.monitors.contains_key(&monitor) {
            return Err(Error::UnknownId {
                kind: "monitor",
                id: *monitor,
            });
        }

        for ws in self.workspaces.iter_mut() {
            if ws.monitor() == Some(monitor) {
                ws.set_monitor(None);
            }
        }
        for m in self.monitors.values_mut() {
            if m.workspace() == Some(wix) {
                m.set_workspace(None);
            }
        }

        self.workspaces[wix].set_monitor(Some(monitor));
        self.monitors.get_mut(&monitor).unwrap().set_workspace(Some(wix));
        Ok(())
    }

    /// Give every workspace that currently has no monitor a free one. Workspaces are
    /// filled in index order; for each one, `policy` orders the remaining free monitors
    /// and the first is taken. Stops
    /// once no free monitor remains — any workspaces left over simply stay unassigned
    /// until a monitor frees up (e.g. on the next call, after a monitor is added or one
    /// of its peers is removed).
    pub fn assign_free_monitors(&mut self, policy: crate::core::config::MonitorDuplicationPolicy) {
        use crate::core::config::MonitorDuplicationPolicy;

        let unassigned_workspaces: Vec<usize> = self
            .workspaces
            .iter()
            .enumerate()
            .filter(|(_, ws)| ws.monitor().is_none())
            .map(|(i, _)| i)
            .collect();

        for wix in unassigned_workspaces {
            let mut free: Vec<MonitorId> = self
                .monitors
                .values()
                .filter(|m| m.workspace().is_none())
                .map(|m| m.id())
                .collect();
            if free.is_empty() {
                break;
            }
            free.sort_by(|a, b| match policy {
                MonitorDuplicationPolicy::PreferPrimary => {
                    let pa = self.monitors[a].is_primary();
                    let pb = self.monitors[b].is_primary();
                    pb.cmp(&pa).then_with(|| a.cmp(b))
                }
                MonitorDuplicationPolicy::PreferById => a.cmp(b),
            });
            let chosen = free[0];
            self.workspaces[wix].set_monitor(Some(chosen));
            self.monitors.get_mut(&chosen).unwrap().set_workspace(Some(wix));
        }
    }

    // ---- focus bookkeeping ----------------------------------------------------

    /// The next value in the monotonic focus-tick counter, used to stamp
    /// [crate::core::window::Window::focused_time] whenever a master focuses a window.
    pub fn next_focus_tick(&mut self) -> u64 {
        let tick = self.next_focus_tick;
        self.next_focus_tick += 1;
        tick
    }

    // ---- integrity validation -------------------------------------------

    /// Walk every cross-entity reference and return a description of each one found
    /// inconsistent. An empty result means the registry is internally consistent.
    ///
    /// Checked: window<->workspace membership is mutual and exclusive; every id in a
    /// master's window stack resolves to a live window and appears at most once;
    /// monitor<->workspace assignment is mutual; a monitor's viewport never exceeds its
    /// base.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for window in self.windows.values() {
            if let Some(wix) = window.workspace() {
                match self.workspaces.get(wix) {
                    Some(ws) if ws.window_ids().any(|id| id == window.id()) => {}
                    Some(_) => problems.push(format!(
                        "window {} claims workspace {wix} but is absent from its stack",
                        *window.id()
                    )),
                    None => problems.push(format!(
                        "window {} claims non-existent workspace {wix}",
                        *window.id()
                    )),
                }
                for (j, other) in self.workspaces.iter().enumerate() {
                    if j != wix && other.window_ids().any(|id| id == window.id()) {
                        problems.push(format!(
                            "window {} is present in workspace {j} as well as its own workspace {wix}",
                            *window.id()
                        ));
                    }
                }
            }
        }
        for (i, ws) in self.workspaces.iter().enumerate() {
            for id in ws.window_ids() {
                match self.windows.get(&id) {
                    Some(w) if w.workspace() == Some(i) => {}
                    Some(w) => problems.push(format!(
                        "workspace {i} stacks window {} but that window points at workspace {:?}",
                        *id,
                        w.workspace()
                    )),
                    None => problems.push(format!(
                        "workspace {i} stacks window {} which no longer exists",
                        *id
                    )),
                }
            }
        }

        for master in self.masters.values() {
            let mut seen = std::collections::HashSet::new();
            for id in master.window_stack.iter() {
                if !self.windows.contains_key(id) {
                    problems.push(format!(
                        "master {} window stack references dead window {}",
                        *master.id(),
                        **id
                    ));
                }
                if !seen.insert(*id) {
                    problems.push(format!(
                        "master {} window stack contains duplicate entry {}",
                        *master.id(),
                        **id
                    ));
                }
            }
        }

        for monitor in self.monitors.values() {
            if let Some(wix) = monitor.workspace() {
                match self.workspaces.get(wix) {
                    Some(ws) if ws.monitor() == Some(monitor.id()) => {}
                    _ => problems.push(format!(
                        "monitor {} claims workspace {wix} but that workspace does not point back",
                        *monitor.id()
                    )),
                }
            }
            let viewport = monitor.viewport();
            let base = monitor.base();
            if (viewport.w as u64 * viewport.h as u64) > (base.w as u64 * base.h as u64) {
                problems.push(format!(
                    "monitor {} viewport {viewport:?} exceeds its base {base:?}",
                    *monitor.id()
                ));
            }
        }
        for (i, ws) in self.workspaces.iter().enumerate() {
            if let Some(mid) = ws.monitor() {
                match self.monitors.get(&mid) {
                    Some(m) if m.workspace() == Some(i) => {}
                    _ => problems.push(format!(
                        "workspace {i} claims monitor {} but that monitor does not point back",
                        *mid
                    )),
                }
            }
        }

        problems
    }

    /// Clear every offending reference [Registry::check_invariants] finds, returning the
    /// list of problems that were repaired. Used by the non-development error path.
    pub fn repair_invariants(&mut self) -> Vec<String> {
        let problems = self.check_invariants();
        if problems.is_empty() {
            return problems;
        }

        for i in 0..self.workspaces.len() {
            let stale: Vec<Xid> = self.workspaces[i]
                .window_ids()
                .filter(|id| {
                    self.windows
                        .get(id)
                        .map(|w| w.workspace() != Some(i))
                        .unwrap_or(true)
                })
                .collect();
            for id in stale {
                self.workspaces[i].remove_window(id);
            }
        }
        for window in self.windows.values_mut() {
            if let Some(wix) = window.workspace() {
                if self.workspaces.get(wix).is_none() {
                    window.set_workspace(None);
                }
            }
        }

        for master in self.masters.values_mut() {
            let mut seen = std::collections::HashSet::new();
            let stale: Vec<Xid> = master
                .window_stack
                .iter()
                .copied()
                .filter(|id| !self.windows.contains_key(id) || !seen.insert(*id))
                .collect();
            for id in stale {
                master.window_stack.remove_element(&id);
            }
        }

        for monitor in self.monitors.values_mut() {
            if let Some(wix) = monitor.workspace() {
                let back_points = self
                    .workspaces
                    .get(wix)
                    .map(|ws| ws.monitor() == Some(monitor.id()))
                    .unwrap_or(false);
                if !back_points {
                    monitor.set_workspace(None);
                }
            }
        }
        for ws in self.workspaces.iter_mut() {
            if let Some(mid) = ws.monitor() {
                let back_points = self
                    .monitors
                    .get(&mid)
                    .map(|m| m.workspace() == Some(ws.index()))
                    .unwrap_or(false);
                if !back_points {
                    ws.set_monitor(None);
                }
            }
        }

        warn!(count = problems.len(), "repaired integrity violations");
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_types::Rect;
    use crate::core::layout::{monocle, Layout, LayoutArgs};
    use crate::core::window::Window;

    fn registry() -> Registry {
        Registry::new(
            &["1".into(), "2".into()],
            vec![Layout::new("[]=", monocle, LayoutArgs::default())],
        )
    }

    #[test]
    fn inserting_duplicate_window_id_is_an_error() {
        let mut r = registry();
        r.insert_window(Window::new(Xid::from(1), None, Rect::default(), 0)).unwrap();
        let err = r
            .insert_window(Window::new(Xid::from(1), None, Rect::default(), 0))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId { kind: "window", .. }));
    }

    #[test]
    fn move_to_workspace_keeps_both_sides_in_sync() {
        let mut r = registry();
        r.insert_window(Window::new(Xid::from(1), None, Rect::default(), 0)).unwrap();
        r.move_to_workspace(Xid::from(1), Some(0)).unwrap();
        assert_eq!(r.window(Xid::from(1)).unwrap().workspace(), Some(0));
        assert!(r.workspace(0).unwrap().window_ids().any(|id| id == Xid::from(1)));

        r.move_to_workspace(Xid::from(1), Some(1)).unwrap();
        assert!(!r.workspace(0).unwrap().window_ids().any(|id| id == Xid::from(1)));
        assert!(r.workspace(1).unwrap().window_ids().any(|id| id == Xid::from(1)));
    }

    #[test]
    fn shrinking_workspace_count_merges_into_last_survivor() {
        let mut r = registry();
        r.insert_window(Window::new(Xid::from(1), None, Rect::default(), 0)).unwrap();
        r.move_to_workspace(Xid::from(1), Some(1)).unwrap();
        r.set_workspace_count(1, vec![Layout::new("[]=", monocle, LayoutArgs::default())]);
        assert_eq!(r.workspaces().len(), 1);
        assert_eq!(r.window(Xid::from(1)).unwrap().workspace(), Some(0));
    }

    #[test]
    fn check_invariants_is_empty_for_a_consistent_registry() {
        let mut r = registry();
        r.insert_window(Window::new(Xid::from(1), None, Rect::default(), 0)).unwrap();
        r.move_to_workspace(Xid::from(1), Some(0)).unwrap();
        assert!(r.check_invariants().is_empty());
    }

    #[test]
    fn repair_invariants_drops_a_dangling_master_stack_entry() {
        let mut r = registry();
        r.insert_master(Master::new(DEFAULT_MASTER, SlaveId(1), SlaveId(2), "default"))
            .unwrap();
        r.master_mut(DEFAULT_MASTER).unwrap().window_stack.push(Xid::from(404));
        assert!(!r.check_invariants().is_empty());

        r.repair_invariants();
        assert!(r.check_invariants().is_empty());
        assert!(!r
            .master(DEFAULT_MASTER)
            .unwrap()
            .window_stack
            .contains(&Xid::from(404)));
    }

    #[test]
    fn repair_invariants_clears_a_one_sided_monitor_workspace_link() {
        let mut r = registry();
        r.insert_monitor(Monitor::new(MonitorId::from(1), true, Rect::new(0, 0, 800, 600)))
            .unwrap();
        // force a one-sided link: the monitor claims workspace 0 without the
        // workspace claiming the monitor back
        r.monitor_mut(MonitorId::from(1)).unwrap().set_workspace(Some(0));
        assert!(!r.check_invariants().is_empty());

        r.repair_invariants();
        assert!(r.check_invariants().is_empty());
        assert_eq!(r.monitor(MonitorId::from(1)).unwrap().workspace(), None);
    }

    #[test]
    fn removing_a_master_reattaches_its_slaves_to_default() {
        let mut r = registry();
        r.insert_master(Master::new(DEFAULT_MASTER, SlaveId(1), SlaveId(2), "default"))
            .unwrap();
        r.insert_master(Master::new(MasterId(9), SlaveId(3), SlaveId(4), "extra"))
            .unwrap();
        r.insert_slave(Slave::new(SlaveId(3), SlaveKind::Keyboard, "kbd", false))
            .unwrap();
        r.slave_mut(SlaveId(3)).unwrap().attach(MasterId(9));

        r.remove_master(MasterId(9));
        assert_eq!(r.slave(SlaveId(3)).unwrap().attached_master(), Some(DEFAULT_MASTER));
    }

    #[test]
    fn assign_free_monitors_pairs_every_unassigned_workspace_with_a_free_monitor() {
        let mut r = registry();
        r.insert_monitor(Monitor::new(MonitorId::from(1), false, Rect::new(0, 0, 800, 600)))
            .unwrap();
        r.insert_monitor(Monitor::new(MonitorId::from(2), true, Rect::new(800, 0, 800, 600)))
            .unwrap();

        r.assign_free_monitors(crate::core::config::MonitorDuplicationPolicy::PreferPrimary);

        // workspace 0 gets the primary monitor first regardless of id ordering.
        assert_eq!(r.workspace(0).unwrap().monitor(), Some(MonitorId::from(2)));
        assert_eq!(r.monitor(MonitorId::from(2)).unwrap().workspace(), Some(0));
        // workspace 1 takes whatever is left.
        assert_eq!(r.workspace(1).unwrap().monitor(), Some(MonitorId::from(1)));
        assert_eq!(r.monitor(MonitorId::from(1)).unwrap().workspace(), Some(1));
    }

    #[test]
    fn assign_free_monitors_prefer_by_id_ignores_primary() {
        let mut r = registry();
        r.insert_monitor(Monitor::new(MonitorId::from(5), true, Rect::new(0, 0, 800, 600)))
            .unwrap();
        r.insert_monitor(Monitor::new(MonitorId::from(2), false, Rect::new(800, 0, 800, 600)))
            .unwrap();

        r.assign_free_monitors(crate::core::config::MonitorDuplicationPolicy::PreferById);

        assert_eq!(r.workspace(0).unwrap().monitor(), Some(MonitorId::from(2)));
        assert_eq!(r.workspace(1).unwrap().monitor(), Some(MonitorId::from(5)));
    }

    #[test]
    fn assign_free_monitors_leaves_surplus_workspaces_unassigned() {
        let mut r = registry();
        r.insert_monitor(Monitor::new(MonitorId::from(1), true, Rect::new(0, 0, 800, 600)))
            .unwrap();

        r.assign_free_monitors(crate::core::config::MonitorDuplicationPolicy::PreferPrimary);

        assert_eq!(r.workspace(0).unwrap().monitor(), Some(MonitorId::from(1)));
        assert_eq!(r.workspace(1).unwrap().monitor(), None);
    }
}
