//! The MPX master (an independent keyboard/pointer pair) and its per-master state.
use crate::core::bindings::BindingId;
use crate::core::data_types::Point;
use crate::core::ids::{MasterId, SlaveId, Xid};
use crate::core::ring::Ring;

/// An active modal binding scope pushed onto a [Master]'s chain stack.
///
/// Each scope records what it grabbed so that popping it (on completion, cancellation
/// or master teardown) can release exactly what was taken.
#[derive(Debug, Clone)]
pub struct ChainScope {
    /// The binding that opened this chain (its children shadow the global set).
    pub binding: BindingId,
    /// `true` if this scope took a whole-device grab rather than per-child grabs.
    pub whole_device_grabbed: bool,
    /// `true` unless the chain opted in to staying open on a non-matching key
    /// (`noEndOnPassThrough`).
    pub ends_on_pass_through: bool,
}

/// A color used to draw a window's border while it is focused by some master, or while
/// unfocused. Left as a plain RGB value; the concrete rendering is an external
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

/// An MPX master: an independent keyboard/pointer pair that the X server and this
/// window manager both treat as its own user.
///
/// Masters own their own focus history, active chain stack and bindings, and drive
/// a single active workspace independently of every other master.
#[derive(Debug, Clone)]
pub struct Master {
    id: MasterId,
    keyboard: SlaveId,
    pointer: SlaveId,
    name: String,
    pub(crate) focused_color: Color,
    /// Most-recent-first stack of windows this master has focused.
    pub(crate) window_stack: Ring<Xid>,
    /// Active chain scopes, innermost (most recently pushed) last.
    pub(crate) chain_stack: Vec<ChainScope>,
    /// `true` while the focus stack is frozen (Alt-Tab style cycling): focus events
    /// still move the cursor but do not reorder `window_stack`.
    pub(crate) frozen: bool,
    /// The stack index currently highlighted while frozen.
    pub(crate) frozen_cursor: usize,
    last_active_slave: Option<SlaveId>,
    active_workspace: usize,
    last_pointer_position: Point,
    last_binding_triggered: Option<BindingId>,
    mode: u32,
    /// Ids recently visited by `findAndRaise` for the rule currently in effect; reset
    /// when the focused window stops matching or every candidate has been visited.
    pub(crate) visited_cache: Vec<Xid>,
}

impl Master {
    /// Construct a new [Master] for the given keyboard/pointer device pair.
    pub fn new(id: MasterId, keyboard: SlaveId, pointer: SlaveId, name: impl Into<String>) -> Self {
        Self {
            id,
            keyboard,
            pointer,
            name: name.into(),
            focused_color: Color(0xcc241d),
            window_stack: Ring::default(),
            chain_stack: Vec::new(),
            frozen: false,
            frozen_cursor: 0,
            last_active_slave: None,
            active_workspace: 0,
            last_pointer_position: Point::default(),
            last_binding_triggered: None,
            mode: 0,
            visited_cache: Vec::new(),
        }
    }

    /// This master's id.
    pub fn id(&self) -> MasterId {
        self.id
    }

    /// The attached keyboard slave id.
    pub fn keyboard(&self) -> SlaveId {
        self.keyboard
    }

    /// The attached pointer slave id.
    pub fn pointer(&self) -> SlaveId {
        self.pointer
    }

    /// This master's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The window at the head of this master's stack, i.e. its focused window unless
    /// the stack is frozen.
    pub fn focused_window(&self) -> Option<Xid> {
        if self.frozen {
            self.window_stack.iter().nth(self.frozen_cursor).copied()
        } else {
            self.window_stack.iter().next().copied()
        }
    }

    /// `true` while this master's focus stack is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Every window id currently present in this master's stack, most-recent-first.
    pub fn window_ids(&self) -> impl Iterator<Item = Xid> + '_ {
        self.window_stack.iter().copied()
    }

    /// The currently active chain scope, if any (the top of [Master::chain_stack]).
    pub fn active_chain(&self) -> Option<&ChainScope> {
        self.chain_stack.last()
    }

    /// `true` if this master has an active modal chain.
    pub fn has_active_chain(&self) -> bool {
        !self.chain_stack.is_empty()
    }

    /// The last slave device to generate an event for this master.
    pub fn last_active_slave(&self) -> Option<SlaveId> {
        self.last_active_slave
    }

    /// Record the last slave device to generate an event for this master.
    pub fn set_last_active_slave(&mut self, id: SlaveId) {
        self.last_active_slave = Some(id);
    }

    /// The workspace index this master currently has active.
    pub fn active_workspace(&self) -> usize {
        self.active_workspace
    }

    /// Switch this master's active workspace.
    pub fn set_active_workspace(&mut self, wix: usize) {
        self.active_workspace = wix;
    }

    /// The last known pointer position for this master.
    pub fn last_pointer_position(&self) -> Point {
        self.last_pointer_position
    }

    /// Update the last known pointer position for this master.
    pub fn set_last_pointer_position(&mut self, p: Point) {
        self.last_pointer_position = p;
    }

    /// The last binding that this master triggered, if any.
    pub fn last_binding_triggered(&self) -> Option<BindingId> {
        self.last_binding_triggered
    }

    /// Record the last binding this master triggered.
    pub fn set_last_binding_triggered(&mut self, id: BindingId) {
        self.last_binding_triggered = Some(id);
    }

    /// This master's current mode, consulted by binding mode predicates.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Switch this master's current mode.
    pub fn set_mode(&mut self, mode: u32) {
        self.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_window_is_stack_head_unless_frozen() {
        let mut m = Master::new(MasterId(2), SlaveId(3), SlaveId(4), "m2");
        m.window_stack.push_front(Xid(1));
        m.window_stack.push_front(Xid(2));
        assert_eq!(m.focused_window(), Some(Xid(2)));

        m.frozen = true;
        m.frozen_cursor = 1;
        assert_eq!(m.focused_window(), Some(Xid(1)));
    }
}
