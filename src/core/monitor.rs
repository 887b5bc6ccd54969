//! Physical output tracking: a monitor's geometry and the dock struts reserved on it.
use crate::core::data_types::{Point, Rect};
use crate::core::ids::MonitorId;

/// A physical output (CRTC), tracked independently of any master.
///
/// `base` is the monitor's full geometry as reported by RandR; `viewport` is `base`
/// shrunk by every registered dock's [crate::core::window::Strut].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    id: MonitorId,
    primary: bool,
    base: Rect,
    viewport: Rect,
    workspace: Option<usize>,
}

impl Monitor {
    /// Construct a new [Monitor] with no dock struts applied yet.
    pub fn new(id: MonitorId, primary: bool, base: Rect) -> Self {
        Self {
            id,
            primary,
            base,
            viewport: base,
            workspace: None,
        }
    }

    /// This monitor's id.
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// `true` if this is the primary output.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub(crate) fn set_primary(&mut self, primary: bool) {
        self.primary = primary;
    }

    /// This monitor's full geometry, ignoring any reserved dock struts.
    pub fn base(&self) -> Rect {
        self.base
    }

    /// Update this monitor's base geometry (e.g. on a RandR `ScreenChangeNotify`),
    /// recomputing its viewport from the same strut set.
    pub fn set_base(&mut self, base: Rect, struts: &[crate::core::window::Strut]) {
        self.base = base;
        self.recompute_viewport(struts);
    }

    /// The area available for tiling once every dock strut on this monitor has been
    /// subtracted.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Recompute `viewport` from `base` and the given set of dock struts.
    pub fn recompute_viewport(&mut self, struts: &[crate::core::window::Strut]) {
        let mut v = self.base;
        for s in struts {
            let clamped_left = s.left.min(v.w);
            let clamped_right = s.right.min(v.w.saturating_sub(clamped_left));
            let clamped_top = s.top.min(v.h);
            let clamped_bottom = s.bottom.min(v.h.saturating_sub(clamped_top));

            v = Rect::new(
                v.x + clamped_left as i32,
                v.y + clamped_top as i32,
                v.w.saturating_sub(clamped_left + clamped_right),
                v.h.saturating_sub(clamped_top + clamped_bottom),
            );
        }
        self.viewport = v;
    }

    /// `true` if `p` falls within this monitor's base geometry.
    pub fn contains(&self, p: Point) -> bool {
        self.base.contains_point(p)
    }

    /// The workspace index currently displayed on this monitor, if any.
    pub fn workspace(&self) -> Option<usize> {
        self.workspace
    }

    pub(crate) fn set_workspace(&mut self, wix: Option<usize>) {
        self.workspace = wix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::window::Strut;

    #[test]
    fn viewport_shrinks_by_a_single_top_strut() {
        let mut m = Monitor::new(MonitorId(1), true, Rect::new(0, 0, 1920, 1080));
        let strut = Strut {
            top: 30,
            left: 0,
            right: 0,
            bottom: 0,
            vertical_range: (0, 0),
            horizontal_range: (0, 1920),
        };
        m.recompute_viewport(&[strut]);
        assert_eq!(m.viewport(), Rect::new(0, 30, 1920, 1050));
    }

    #[test]
    fn oversized_struts_never_produce_negative_viewport() {
        let mut m = Monitor::new(MonitorId(1), true, Rect::new(0, 0, 100, 100));
        let strut = Strut {
            top: 80,
            bottom: 80,
            left: 0,
            right: 0,
            vertical_range: (0, 0),
            horizontal_range: (0, 100),
        };
        m.recompute_viewport(&[strut]);
        assert_eq!(m.viewport().h, 0);
    }
}
