//! Metadata tracked for a single managed X window.
use crate::core::data_types::Rect;
use crate::core::ids::Xid;

/// A dock's reserved strut, in the ICCCM/EWMH sense: a band of a monitor's edge that
/// tiling must not place windows into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strut {
    /// Pixels reserved from the left edge.
    pub left: u32,
    /// Pixels reserved from the right edge.
    pub right: u32,
    /// Pixels reserved from the top edge.
    pub top: u32,
    /// Pixels reserved from the bottom edge.
    pub bottom: u32,
    /// The vertical range (start_y, end_y) that `left`/`right` apply over.
    pub vertical_range: (u32, u32),
    /// The horizontal range (start_x, end_x) that `top`/`bottom` apply over.
    pub horizontal_range: (u32, u32),
}

impl Strut {
    /// A strut with zero reservation in every direction.
    pub fn none() -> Self {
        Self {
            left: 0,
            right: 0,
            top: 0,
            bottom: 0,
            vertical_range: (0, 0),
            horizontal_range: (0, 0),
        }
    }

    /// `true` if this strut reserves no space at all.
    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }
}

/// A managed X resource: either a normal client window or a dock.
///
/// Enforcement of the workspace-membership and geometry-lock invariants lives in
/// [crate::core::registry::Registry].
#[derive(Debug, Clone)]
pub struct Window {
    id: Xid,
    parent: Option<Xid>,
    geometry: Rect,
    border: u32,
    /// Geometry to restore when the window leaves fullscreen / maximized state.
    pub saved_geometry: Option<Rect>,
    mask: crate::core::data_types::WindowMask,
    type_atom: Option<String>,
    name: String,
    class: String,
    instance: String,
    transient_for: Option<Xid>,
    group: Option<Xid>,
    strut: Option<Strut>,
    workspace: Option<usize>,
    requested_event_mask: u32,
    effective_event_mask: u32,
    geometry_lock: u32,
    /// Monotonic tick set each time this window is focused, used for MRU bookkeeping.
    pub focused_time: u64,
    /// Set when a configure/map request for this window was rejected by the X server;
    /// cleared and retried on the next tiling pass.
    pub transient_failure: bool,
}

impl Window {
    /// Construct a newly mapped [Window] with minimal metadata. Additional properties
    /// (class/name/hints) are filled in by `PreRegisterWindow`/`PostRegisterWindow` rules.
    pub fn new(id: Xid, parent: Option<Xid>, geometry: Rect, border: u32) -> Self {
        Self {
            id,
            parent,
            geometry,
            border,
            saved_geometry: None,
            mask: crate::core::data_types::WindowMask::MAPPABLE,
            type_atom: None,
            name: String::new(),
            class: String::new(),
            instance: String::new(),
            transient_for: None,
            group: None,
            strut: None,
            workspace: None,
            requested_event_mask: 0,
            effective_event_mask: 0,
            geometry_lock: 0,
            focused_time: 0,
            transient_failure: false,
        }
    }

    /// The X id of this window.
    pub fn id(&self) -> Xid {
        self.id
    }

    /// The id of this window's parent (its reparenting frame, if any).
    pub fn parent(&self) -> Option<Xid> {
        self.parent
    }

    /// This window's last known geometry.
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Overwrite this window's cached geometry.
    ///
    /// Has no effect while [Window::geometry_locked] is true: a locked window's
    /// geometry is only ever changed by whoever is holding the lock.
    pub fn set_geometry(&mut self, r: Rect) {
        if self.geometry_lock == 0 {
            self.geometry = r;
        }
    }

    /// Force-set geometry, bypassing the geometry lock. Used by the tiling invoker,
    /// which owns geometry changes regardless of lock state.
    pub fn force_set_geometry(&mut self, r: Rect) {
        self.geometry = r;
    }

    /// This window's border width in pixels.
    pub fn border(&self) -> u32 {
        self.border
    }

    /// Set this window's border width.
    pub fn set_border(&mut self, border: u32) {
        self.border = border;
    }

    /// `true` while external geometry updates are locked out.
    pub fn geometry_locked(&self) -> bool {
        self.geometry_lock > 0
    }

    /// Increment the geometry lock counter (e.g. while a fullscreen transition is
    /// in-flight).
    pub fn lock_geometry(&mut self) {
        self.geometry_lock += 1;
    }

    /// Decrement the geometry lock counter, saturating at zero.
    pub fn unlock_geometry(&mut self) {
        self.geometry_lock = self.geometry_lock.saturating_sub(1);
    }

    /// The current window mask.
    pub fn mask(&self) -> crate::core::data_types::WindowMask {
        self.mask
    }

    /// Overwrite the window mask.
    pub fn set_mask(&mut self, mask: crate::core::data_types::WindowMask) {
        self.mask = mask;
    }

    /// Insert flags into the window mask.
    pub fn insert_mask(&mut self, flags: crate::core::data_types::WindowMask) {
        self.mask.insert(flags);
    }

    /// Remove flags from the window mask.
    pub fn remove_mask(&mut self, flags: crate::core::data_types::WindowMask) {
        self.mask.remove(flags);
    }

    /// The cached `_NET_WM_WINDOW_TYPE` atom name, if known.
    pub fn type_atom(&self) -> Option<&str> {
        self.type_atom.as_deref()
    }

    /// Set the cached window type atom name.
    pub fn set_type_atom(&mut self, atom: impl Into<String>) {
        self.type_atom = Some(atom.into());
    }

    /// The cached window title (`_NET_WM_NAME`/`WM_NAME`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Update the cached window title.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The `WM_CLASS` class string.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The `WM_CLASS` instance string.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Set the `WM_CLASS` class/instance pair.
    pub fn set_class(&mut self, class: impl Into<String>, instance: impl Into<String>) {
        self.class = class.into();
        self.instance = instance.into();
    }

    /// `WM_TRANSIENT_FOR`, if set.
    pub fn transient_for(&self) -> Option<Xid> {
        self.transient_for
    }

    /// Set `WM_TRANSIENT_FOR`.
    pub fn set_transient_for(&mut self, id: Option<Xid>) {
        self.transient_for = id;
    }

    /// The window group leader id, if any.
    pub fn group(&self) -> Option<Xid> {
        self.group
    }

    /// Set the window group leader id.
    pub fn set_group(&mut self, id: Option<Xid>) {
        self.group = id;
    }

    /// `true` if this window is a dock (has a registered [Strut]).
    pub fn is_dock(&self) -> bool {
        self.strut.is_some()
    }

    /// The dock strut this window reserves, if it is a dock.
    pub fn strut(&self) -> Option<Strut> {
        self.strut
    }

    /// Register this window as a dock with the given strut.
    pub fn set_strut(&mut self, strut: Strut) {
        self.strut = Some(strut);
    }

    /// Clear dock status.
    pub fn clear_strut(&mut self) {
        self.strut = None;
    }

    /// The workspace index this window currently belongs to, if any.
    pub fn workspace(&self) -> Option<usize> {
        self.workspace
    }

    /// Reassign this window to (or remove it from) a workspace.
    ///
    /// Only updates this window's own pointer; callers are responsible for updating
    /// the old/new [crate::core::workspace::Workspace] stacks to keep them consistent
    /// with it — see [crate::core::registry::Registry::move_to_workspace].
    pub(crate) fn set_workspace(&mut self, wix: Option<usize>) {
        self.workspace = wix;
    }

    /// The event mask the client itself requested via `XSelectInput`.
    pub fn requested_event_mask(&self) -> u32 {
        self.requested_event_mask
    }

    /// Set the event mask the client requested.
    pub fn set_requested_event_mask(&mut self, mask: u32) {
        self.requested_event_mask = mask;
    }

    /// The event mask actually selected on this window by the window manager.
    pub fn effective_event_mask(&self) -> u32 {
        self.effective_event_mask
    }

    /// Set the event mask actually selected on this window.
    pub fn set_effective_event_mask(&mut self, mask: u32) {
        self.effective_event_mask = mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_is_locked_out_while_lock_held() {
        let mut w = Window::new(Xid(1), None, Rect::new(0, 0, 100, 100), 2);
        w.lock_geometry();
        w.set_geometry(Rect::new(10, 10, 50, 50));
        assert_eq!(w.geometry(), Rect::new(0, 0, 100, 100));
        w.unlock_geometry();
        w.set_geometry(Rect::new(10, 10, 50, 50));
        assert_eq!(w.geometry(), Rect::new(10, 10, 50, 50));
    }

    #[test]
    fn unlock_saturates_at_zero() {
        let mut w = Window::new(Xid(1), None, Rect::new(0, 0, 1, 1), 0);
        w.unlock_geometry();
        assert!(!w.geometry_locked());
    }
}
