//! Simple geometry, change and bitset types shared across the core.
use bitflags::bitflags;

/// An x,y coordinate pair, absolute and relative to the root window.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    /// Absolute x coordinate relative to the root window.
    pub x: i32,
    /// Absolute y coordinate relative to the root window.
    pub y: i32,
}

impl Point {
    /// Construct a new [Point].
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A window or monitor rectangle: top-left corner plus extent.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    /// x coordinate of the top-left corner.
    pub x: i32,
    /// y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Rect {
    /// Construct a new [Rect].
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Destructure into `(x, y, w, h)`.
    pub fn values(&self) -> (i32, i32, u32, u32) {
        (self.x, self.y, self.w, self.h)
    }

    /// The area of this rectangle in pixels.
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// `true` if `p` falls within this rectangle.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x
            && p.x < self.x + self.w as i32
            && p.y >= self.y
            && p.y < self.y + self.h as i32
    }

    /// `true` if this rectangle and `other` share any area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w as i32
            && other.x < self.x + self.w as i32
            && self.y < other.y + other.h as i32
            && other.y < self.y + self.h as i32
    }

    /// Clamp `self` so that it never extends outside of `bounds`.
    ///
    /// Used by dock registration: a dock whose strut exceeds its monitor's dimensions
    /// is clamped to the monitor instead of rejected.
    pub fn clamped_to(&self, bounds: &Rect) -> Rect {
        let x = self.x.max(bounds.x);
        let y = self.y.max(bounds.y);
        let max_w = (bounds.x + bounds.w as i32 - x).max(0) as u32;
        let max_h = (bounds.y + bounds.h as i32 - y).max(0) as u32;
        Rect::new(x, y, self.w.min(max_w), self.h.min(max_h))
    }
}

/// Increment / decrement a value (layout ratio nudges, workspace count changes, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Change {
    /// Increase the value.
    More,
    /// Decrease the value, clamping at whatever floor makes sense for the caller.
    Less,
}

/// A direction to permute a [crate::core::ring::Ring].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Increase the index, wrapping if needed.
    Forward,
    /// Decrease the index, wrapping if needed.
    Backward,
}

impl Direction {
    /// Invert this [Direction].
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

bitflags! {
    /// The canonical per-window bitset.
    ///
    /// A 32-bit mask divided into visibility, geometry policy, stacking, focus /
    /// interaction and ICCCM protocol groups. A configured subset
    /// ([crate::core::config::Config::masks_to_sync]) is mirrored into `_NET_WM_STATE`
    /// by [crate::core::protocol::sync_window_state].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowMask: u32 {
        // Visibility
        /// The window may be mapped (passed `PreRegisterWindow` rules, has normal hints).
        const MAPPABLE          = 1 << 0;
        /// The window is currently mapped on the X server.
        const MAPPED            = 1 << 1;
        /// The window is fully visible on its monitor's viewport.
        const FULLY_VISIBLE     = 1 << 2;
        /// The window is partially occluded or clipped by its viewport.
        const PARTIALLY_VISIBLE = 1 << 3;
        /// The window is fully hidden (different workspace, iconified, ...).
        const HIDDEN            = 1 << 4;

        // Geometry policy
        /// The window floats instead of participating in tiling.
        const FLOATING       = 1 << 5;
        /// The window is left alone by the tiling invoker entirely.
        const NO_TILE        = 1 << 6;
        /// The window is forced to its monitor's base rectangle.
        const FULLSCREEN     = 1 << 7;
        /// The window is forced to the root window's dimensions.
        const ROOT_FULLSCREEN = 1 << 8;
        /// The window is maximized horizontally.
        const X_MAXIMIZED    = 1 << 9;
        /// The window is maximized vertically.
        const Y_MAXIMIZED    = 1 << 10;
        /// The window is centered horizontally.
        const X_CENTERED     = 1 << 11;
        /// The window is centered vertically.
        const Y_CENTERED     = 1 << 12;

        // Stacking
        /// The window should be kept above its tiled siblings.
        const ABOVE            = 1 << 13;
        /// The window should be kept below its tiled siblings.
        const BELOW            = 1 << 14;
        /// The window should always float to the top of the stack.
        const ALWAYS_ON_TOP    = 1 << 15;
        /// The window should always sink to the bottom of the stack.
        const ALWAYS_ON_BOTTOM = 1 << 16;
        /// The window should remain visible across workspace switches.
        const STICKY           = 1 << 17;

        // Focus / interaction
        /// The window accepts input focus.
        const INPUT           = 1 << 18;
        /// Focusing this window should not splice it to the head of a master's stack.
        const NO_RECORD_FOCUS = 1 << 19;
        /// The window has requested attention (`_NET_WM_STATE_DEMANDS_ATTENTION`-ish).
        const URGENT          = 1 << 20;
        /// The window is a modal dialog.
        const MODAL           = 1 << 21;
        /// The window prefers to be placed on the primary monitor.
        const PRIMARY_MONITOR = 1 << 22;

        // ICCCM protocol membership
        /// `WM_PROTOCOLS` contains `WM_TAKE_FOCUS`.
        const WM_TAKE_FOCUS   = 1 << 23;
        /// `WM_PROTOCOLS` contains `WM_DELETE_WINDOW`.
        const WM_DELETE_WINDOW = 1 << 24;
        /// `WM_PROTOCOLS` contains `WM_PING`.
        const WM_PING         = 1 << 25;
    }
}

impl WindowMask {
    /// The subset of flags that the tiling signature cares about when deciding whether a
    /// workspace's window-set has changed.
    pub fn tile_relevant(self) -> WindowMask {
        self & (WindowMask::FLOATING
            | WindowMask::NO_TILE
            | WindowMask::FULLSCREEN
            | WindowMask::ROOT_FULLSCREEN
            | WindowMask::X_MAXIMIZED
            | WindowMask::Y_MAXIMIZED
            | WindowMask::X_CENTERED
            | WindowMask::Y_CENTERED
            | WindowMask::ABOVE
            | WindowMask::BELOW
            | WindowMask::ALWAYS_ON_TOP
            | WindowMask::ALWAYS_ON_BOTTOM
            | WindowMask::STICKY
            | WindowMask::MAPPED
            | WindowMask::HIDDEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_clamps_oversized_strut_to_monitor() {
        let monitor = Rect::new(0, 0, 1000, 1000);
        let strut = Rect::new(0, 0, 1000, 1200);
        let clamped = strut.clamped_to(&monitor);
        assert_eq!(clamped, Rect::new(0, 0, 1000, 1000));
    }

    #[test]
    fn rect_intersects_is_symmetric() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        let c = Rect::new(200, 200, 10, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn tile_relevant_drops_focus_and_icccm_bits() {
        let m = WindowMask::FLOATING | WindowMask::URGENT | WindowMask::WM_DELETE_WINDOW;
        assert_eq!(m.tile_relevant(), WindowMask::FLOATING);
    }
}
