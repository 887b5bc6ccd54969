//! Strut/viewport arithmetic for dock-reserving windows.
use crate::core::data_types::Rect;
use crate::core::ids::{MonitorId, Xid};
use crate::core::monitor::Monitor;
use crate::core::registry::Registry;
use crate::core::window::Strut;

/// The screen-absolute rectangle(s) a strut reserves, anchored off `root` (the union of
/// every monitor's base). EWMH struts are expressed relative to the whole screen, not a
/// single output, so `right`/`bottom` need the overall width/height to place.
fn strut_reserved_rects(root: Rect, s: &Strut) -> Vec<Rect> {
    let mut rects = Vec::new();
    if s.left > 0 {
        let (y0, y1) = s.vertical_range;
        rects.push(Rect::new(root.x, y0 as i32, s.left, y1.saturating_sub(y0)));
    }
    if s.right > 0 {
        let (y0, y1) = s.vertical_range;
        rects.push(Rect::new(
            root.x + root.w as i32 - s.right as i32,
            y0 as i32,
            s.right,
            y1.saturating_sub(y0),
        ));
    }
    if s.top > 0 {
        let (x0, x1) = s.horizontal_range;
        rects.push(Rect::new(x0 as i32, root.y, x1.saturating_sub(x0), s.top));
    }
    if s.bottom > 0 {
        let (x0, x1) = s.horizontal_range;
        rects.push(Rect::new(
            x0 as i32,
            root.y + root.h as i32 - s.bottom as i32,
            x1.saturating_sub(x0),
            s.bottom,
        ));
    }
    rects
}

/// The smallest rectangle covering every monitor's base, used to anchor `right`/`bottom`
/// struts (expressed as a distance from the far screen edge, not from any one output).
fn root_rect(monitors: impl Iterator<Item = Rect>) -> Rect {
    let mut iter = monitors;
    let Some(first) = iter.next() else {
        return Rect::default();
    };
    iter.fold(first, |acc, r| {
        let x = acc.x.min(r.x);
        let y = acc.y.min(r.y);
        let right = (acc.x + acc.w as i32).max(r.x + r.w as i32);
        let bottom = (acc.y + acc.h as i32).max(r.y + r.h as i32);
        Rect::new(x, y, (right - x) as u32, (bottom - y) as u32)
    })
}

/// Recompute every monitor's viewport from the struts of every currently registered
/// dock window, applying docks in registry iteration order.
///
/// A strut only shrinks the monitors whose base it actually intersects once anchored
/// against the full screen — a panel on one output no longer eats into an unrelated
/// output's viewport.
///
/// Called whenever a dock is registered/unregistered/changes its strut, and whenever
/// monitor geometry changes.
pub fn recompute_all_viewports(registry: &mut Registry) {
    let root = root_rect(registry.monitors().map(|m| m.base()));
    let all_struts: Vec<Strut> = registry
        .window_ids()
        .filter_map(|id| registry.window(id))
        .filter_map(|w| w.strut())
        .collect();

    let monitor_ids: Vec<MonitorId> = registry.monitors().map(|m| m.id()).collect();
    for mid in monitor_ids {
        let base = match registry.monitor(mid) {
            Some(m) => m.base(),
            None => continue,
        };
        let relevant: Vec<Strut> = all_struts
            .iter()
            .copied()
            .filter(|s| strut_reserved_rects(root, s).iter().any(|r| r.intersects(&base)))
            .collect();
        if let Some(monitor) = registry.monitor_mut(mid) {
            monitor.recompute_viewport(&relevant);
        }
    }
}

/// Register `id` as a dock with `strut`, clamping the strut to the owning monitor's
/// base geometry, and recompute every viewport.
///
/// `owning_monitor` is used only to clamp the strut's magnitude to its own base; which
/// monitors the strut actually ends up affecting is decided separately, by whichever
/// outputs its reserved region intersects once anchored against the full screen.
pub fn register_dock(registry: &mut Registry, id: Xid, strut: Strut, owning_monitor: Option<&Monitor>) {
    let clamped = if let Some(m) = owning_monitor {
        let base = m.base();
        Strut {
            left: strut.left.min(base.w),
            right: strut.right.min(base.w),
            top: strut.top.min(base.h),
            bottom: strut.bottom.min(base.h),
            ..strut
        }
    } else {
        strut
    };

    if let Some(w) = registry.window_mut(id) {
        w.set_strut(clamped);
    }
    recompute_all_viewports(registry);
}

/// Unregister `id` as a dock and recompute every viewport.
pub fn unregister_dock(registry: &mut Registry, id: Xid) {
    if let Some(w) = registry.window_mut(id) {
        w.clear_strut();
    }
    recompute_all_viewports(registry);
}
