//! Per-master focus and window-stack maintenance.
use tracing::trace;

use crate::core::data_types::WindowMask;
use crate::core::ids::{MasterId, Xid};
use crate::core::master::Color;
use crate::core::registry::Registry;
use crate::core::window::Window;

/// Handle a focus-change notification for `master` targeting `id`.
///
/// Splices `id` to the head of `master`'s stack unless it is frozen or the window
/// carries [WindowMask::NO_RECORD_FOCUS], stamps its focus timestamp, and updates the
/// master's border color accordingly.
pub fn focus_window(registry: &mut Registry, master: MasterId, id: Xid) {
    let tick = registry.next_focus_tick();

    let no_record = registry
        .window(id)
        .map(|w| w.mask().contains(WindowMask::NO_RECORD_FOCUS))
        .unwrap_or(false);

    if let Some(w) = registry.window_mut(id) {
        w.focused_time = tick;
    }

    let Some(m) = registry.master_mut(master) else {
        return;
    };

    if !no_record && !m.frozen {
        m.window_stack.remove_element(&id);
        m.window_stack.push_front(id);
    }
    m.visited_cache.clear();
    trace!(master = *master, window = *id, "focus changed");
}

/// The window a master should act on given the currently focused id, honoring the
/// frozen-stack cursor.
pub fn focused_window(registry: &Registry, master: MasterId) -> Option<Xid> {
    registry.master(master).and_then(|m| m.focused_window())
}

/// Enter a frozen focus cycle (e.g. on a modifier-only chain-open press).
///
/// While frozen, [advance_frozen_cursor] moves a cursor through the stack without
/// reordering it; [end_frozen_cycle] commits the cursor position back to the head.
pub fn begin_frozen_cycle(registry: &mut Registry, master: MasterId) {
    if let Some(m) = registry.master_mut(master) {
        m.frozen = true;
        m.frozen_cursor = 0;
    }
}

/// Move the frozen cursor one step, wrapping at the ends of the stack.
pub fn advance_frozen_cursor(registry: &mut Registry, master: MasterId, direction: crate::core::data_types::Direction) {
    let Some(m) = registry.master_mut(master) else {
        return;
    };
    if m.window_stack.is_empty() {
        return;
    }
    let len = m.window_stack.len();
    m.frozen_cursor = match direction {
        crate::core::data_types::Direction::Forward => (m.frozen_cursor + 1) % len,
        crate::core::data_types::Direction::Backward => {
            if m.frozen_cursor == 0 {
                len - 1
            } else {
                m.frozen_cursor - 1
            }
        }
    };
}

/// End a frozen cycle, splicing whatever the cursor landed on to the stack head.
///
/// "Unchanged" here refers to the stack *order* below the new head — the
/// previously-cursored window becomes the new head, everything else keeps its
/// relative order.
pub fn end_frozen_cycle(registry: &mut Registry, master: MasterId) {
    let Some(m) = registry.master_mut(master) else {
        return;
    };
    if !m.frozen {
        return;
    }
    if let Some(&id) = m.window_stack.iter().nth(m.frozen_cursor) {
        m.window_stack.remove_element(&id);
        m.window_stack.push_front(id);
    }
    m.frozen = false;
    m.frozen_cursor = 0;
}

/// Find the next window on `wix` satisfying `rule` that `master` hasn't already
/// visited this cycle, splice it to the head of `master`'s stack, and return its id.
///
/// Each master keeps a "recently visited under rule R" list used to cycle
/// `findAndRaise` calls through every match in turn rather than bouncing
/// back to the same one. The cache is reset when the currently focused window stops
/// matching `rule` (a new cycle started under a different rule), or once every
/// candidate has been visited (so the next call wraps back to the first match).
pub fn find_and_raise(
    registry: &mut Registry,
    master: MasterId,
    wix: usize,
    rule: impl Fn(&Window) -> bool,
) -> Option<Xid> {
    let candidates: Vec<Xid> = registry
        .workspace(wix)?
        .window_ids()
        .filter(|&id| registry.window(id).map(|w| rule(w)).unwrap_or(false))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let focused_matches = focused_window(registry, master)
        .map(|id| candidates.contains(&id))
        .unwrap_or(false);

    let m = registry.master_mut(master)?;
    if !focused_matches {
        m.visited_cache.clear();
    }

    let next = candidates
        .iter()
        .copied()
        .find(|id| !m.visited_cache.contains(id));

    let target = match next {
        Some(id) => id,
        None => {
            m.visited_cache.clear();
            candidates[0]
        }
    };
    m.visited_cache.push(target);

    focus_window(registry, master, target);
    Some(target)
}

/// The border color `id` should currently be drawn with: the color of the master that
/// has it focused, or `unfocused` if no master does.
pub fn border_color_for(registry: &Registry, id: Xid, unfocused: Color) -> Color {
    registry
        .masters()
        .find(|m| m.focused_window() == Some(id))
        .map(|m| m.focused_color)
        .unwrap_or(unfocused)
}
