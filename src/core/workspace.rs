//! A Workspace is a named set of windows plus the layouts available to arrange them.
use crate::core::ids::Xid;
use crate::core::layout::Layout;
use crate::core::ring::Ring;

/// A named set of windows tiled according to one of several available layouts.
///
/// Independent of any particular [crate::core::monitor::Monitor] or
/// [crate::core::master::Master] — many masters may each have this workspace active
/// simultaneously, each against a different monitor's viewport.
#[derive(Debug, Clone)]
pub struct Workspace {
    index: usize,
    name: String,
    /// Bottom-to-top X stacking order.
    windows: Ring<Xid>,
    layouts: Ring<Layout>,
    monitor: Option<crate::core::ids::MonitorId>,
}

impl Workspace {
    /// Construct a new [Workspace] with at least one layout available.
    pub fn new(index: usize, name: impl Into<String>, layouts: Vec<Layout>) -> Self {
        assert!(!layouts.is_empty(), "a workspace requires at least one layout");
        Self {
            index,
            name: name.into(),
            windows: Ring::default(),
            layouts: Ring::new(layouts),
            monitor: None,
        }
    }

    /// This workspace's index within the registry's workspace table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// This workspace's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Every window on this workspace, bottom-to-top stacking order.
    pub fn window_ids(&self) -> impl Iterator<Item = Xid> + '_ {
        self.windows.iter().copied()
    }

    /// `true` if no windows are currently assigned to this workspace.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Add `id` to the top of this workspace's stack.
    ///
    /// Callers must also set the window's own `workspace` pointer; see
    /// [crate::core::registry::Registry::move_to_workspace].
    pub(crate) fn push_window(&mut self, id: Xid) {
        if !self.windows.contains(&id) {
            self.windows.push(id);
        }
    }

    /// Remove `id` from this workspace's stack, if present.
    pub(crate) fn remove_window(&mut self, id: Xid) {
        self.windows.remove_element(&id);
    }

    /// Raise `id` to the top of the X stacking order.
    pub fn raise(&mut self, id: Xid) {
        if self.windows.remove_element(&id).is_some() {
            self.windows.push(id);
        }
    }

    /// Lower `id` to the bottom of the X stacking order.
    pub fn lower(&mut self, id: Xid) {
        if self.windows.remove_element(&id).is_some() {
            self.windows.push_front(id);
        }
    }

    /// The layout currently selected for this workspace.
    pub fn active_layout(&self) -> Option<&Layout> {
        self.layouts.focused()
    }

    /// Every layout available to this workspace, in cycling order.
    pub fn layouts(&self) -> &Ring<Layout> {
        &self.layouts
    }

    /// Cycle to the next/previous available layout.
    pub fn cycle_layout(&mut self, direction: crate::core::data_types::Direction) {
        self.layouts.cycle_focus(direction);
    }

    /// Mutate the currently selected layout's tunables.
    pub fn active_layout_mut(&mut self) -> Option<&mut Layout> {
        self.layouts.focused_mut()
    }

    /// The monitor this workspace is currently displayed on, if any.
    pub fn monitor(&self) -> Option<crate::core::ids::MonitorId> {
        self.monitor
    }

    pub(crate) fn set_monitor(&mut self, monitor: Option<crate::core::ids::MonitorId>) {
        self.monitor = monitor;
    }
}
