//! The layout interface: how a workspace's window set becomes a set of placements.
//!
//! Concrete layout algorithms (tiling arrangements themselves) are an external
//! collaborator's concern; this module only defines the seam the tiling invoker in
//! [crate::core::tiling] calls through.
use crate::core::data_types::Rect;
use crate::core::ids::Xid;

/// One window's computed placement, as produced by a [LayoutFunc].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: Xid,
    pub region: Rect,
}

/// A layout algorithm: given the windows on a workspace and the viewport they tile
/// into, produce a placement for each non-floating window.
///
/// Floating and otherwise-excluded windows (see
/// [crate::core::data_types::WindowMask::tile_relevant]) are never passed in; the
/// tiling invoker filters them out before calling a layout.
pub type LayoutFunc = fn(&[Xid], Rect, &LayoutArgs) -> Vec<Placement>;

/// Free-form per-layout tunables (ratio, gap, column count, ...), opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutArgs {
    pub ratio: f32,
    pub gap: u32,
    pub columns: u32,
}

impl Default for LayoutArgs {
    fn default() -> Self {
        Self {
            ratio: 0.5,
            gap: 0,
            columns: 1,
        }
    }
}

/// A named, selectable layout algorithm plus its current tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub symbol: &'static str,
    pub func: LayoutFunc,
    pub args: LayoutArgs,
}

impl Layout {
    pub fn new(symbol: &'static str, func: LayoutFunc, args: LayoutArgs) -> Self {
        Self { symbol, func, args }
    }

    /// Run this layout over `windows` within `viewport`.
    pub fn arrange(&self, windows: &[Xid], viewport: Rect) -> Vec<Placement> {
        (self.func)(windows, viewport, &self.args)
    }
}

/// A single full-area placement for every window: the fallback layout used whenever a
/// workspace has no configured layouts, and a reasonable default for testing.
pub fn monocle(windows: &[Xid], viewport: Rect, _args: &LayoutArgs) -> Vec<Placement> {
    windows
        .iter()
        .map(|&id| Placement { id, region: viewport })
        .collect()
}
