//! The state-change driver / tiling invoker.
//!
//! Tracks a per-workspace signature (window set, tile-relevant masks, layout identity,
//! monitor viewport) and re-tiles only the workspaces whose signature changed since
//! the last pass.
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use tracing::{trace, warn};

use crate::core::data_types::{Rect, WindowMask};
use crate::core::ids::Xid;
use crate::core::layout::Placement;
use crate::core::registry::Registry;
use crate::core::xconnection::XConn;
use crate::error::Result;

bitflags::bitflags! {
    /// What changed since the last [mark_state]/[update_state] pair.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeBits: u8 {
        /// Some workspace's window-set or window-masks changed.
        const WORKSPACE_WINDOW_CHANGE  = 1 << 0;
        /// Some workspace's monitor assignment or viewport changed.
        const WORKSPACE_MONITOR_CHANGE = 1 << 1;
        /// A window crossed the mapped/unmapped visibility boundary.
        const WINDOW_CHANGE            = 1 << 2;
    }
}

/// A compact per-workspace signature, compared across ticks to detect whether a
/// re-tile is needed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Signature {
    windows: u64,
    monitor: u64,
}

fn window_signature(registry: &Registry, wix: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    if let Some(ws) = registry.workspace(wix) {
        for id in ws.window_ids() {
            id.hash(&mut hasher);
            if let Some(w) = registry.window(id) {
                w.mask().tile_relevant().bits().hash(&mut hasher);
            }
        }
        if let Some(layout) = ws.active_layout() {
            layout.symbol.hash(&mut hasher);
            layout.args.ratio.to_bits().hash(&mut hasher);
            layout.args.gap.hash(&mut hasher);
            layout.args.columns.hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// Whether `w` should currently be mapped: passed registration (`MAPPABLE`) and not
/// hidden by workspace/iconify state, irrespective of whatever the `MAPPED` bit
/// (the server-side state as of the last map/unmap we issued) currently says.
fn wants_mapped(w: &crate::core::window::Window) -> bool {
    let mask = w.mask();
    mask.contains(WindowMask::MAPPABLE) && !mask.contains(WindowMask::HIDDEN)
}

/// Whether any window on `wix` has drifted from its wanted mapped state, i.e. needs an
/// actual `map_window`/`unmap_window` call to catch the server up.
fn workspace_needs_map_change(registry: &Registry, wix: usize) -> bool {
    let Some(ws) = registry.workspace(wix) else {
        return false;
    };
    ws.window_ids().any(|id| {
        registry
            .window(id)
            .map(|w| wants_mapped(w) != w.mask().contains(WindowMask::MAPPED))
            .unwrap_or(false)
    })
}

fn monitor_signature(registry: &Registry, wix: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    if let Some(ws) = registry.workspace(wix) {
        ws.monitor().map(|m| *m).hash(&mut hasher);
        if let Some(mid) = ws.monitor() {
            if let Some(m) = registry.monitor(mid) {
                let (x, y, w, h) = m.viewport().values();
                (x, y, w, h).hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

/// Snapshots every workspace's current signature. The state-change driver's reference
/// point; call [update_state] afterwards to detect drift.
#[derive(Debug, Default)]
pub struct TileState {
    signatures: HashMap<usize, Signature>,
}

impl TileState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every workspace's current signature.
    pub fn mark_state(&mut self, registry: &Registry) {
        self.signatures.clear();
        for ws in registry.workspaces() {
            let wix = ws.index();
            self.signatures.insert(
                wix,
                Signature {
                    windows: window_signature(registry, wix),
                    monitor: monitor_signature(registry, wix),
                },
            );
        }
    }

    /// Compare the current registry state against the last [TileState::mark_state]
    /// snapshot, returning which workspaces changed and how.
    pub fn update_state(&mut self, registry: &Registry) -> (ChangeBits, Vec<usize>) {
        let mut bits = ChangeBits::empty();
        let mut changed = Vec::new();

        for ws in registry.workspaces() {
            let wix = ws.index();
            let current = Signature {
                windows: window_signature(registry, wix),
                monitor: monitor_signature(registry, wix),
            };
            let previous = self.signatures.get(&wix).copied().unwrap_or_default();

            if current.windows != previous.windows {
                bits |= ChangeBits::WORKSPACE_WINDOW_CHANGE;
                changed.push(wix);
            }
            if current.monitor != previous.monitor {
                bits |= ChangeBits::WORKSPACE_MONITOR_CHANGE;
                if !changed.contains(&wix) {
                    changed.push(wix);
                }
            }
            if workspace_needs_map_change(registry, wix) {
                bits |= ChangeBits::WINDOW_CHANGE;
                if !changed.contains(&wix) {
                    changed.push(wix);
                }
            }
            self.signatures.insert(wix, current);
        }

        (bits, changed)
    }
}

/// Compute target placements for `wix`'s tileable windows and issue the resulting
/// configure/map requests, honoring `NO_TILE`/`FULLSCREEN`/`ROOT_FULLSCREEN` overrides.
///
/// A configure failure is logged and the offending window is marked with a transient
/// failure bit for retry on the next pass; it does not abort the rest of the
/// workspace's tiling pass.
pub fn tile_workspace<X: XConn>(conn: &X, registry: &mut Registry, root: Rect, wix: usize) -> Result<()> {
    let Some(ws) = registry.workspace(wix) else {
        return Ok(());
    };
    let Some(monitor_id) = ws.monitor() else {
        trace!(wix, "workspace has no assigned monitor, skipping tile pass");
        return Ok(());
    };
    let viewport = registry.monitor(monitor_id).map(|m| m.viewport()).unwrap_or_default();
    let base = registry.monitor(monitor_id).map(|m| m.base()).unwrap_or_default();

    let all_ids: Vec<Xid> = registry.workspace(wix).unwrap().window_ids().collect();
    let mut tileable = Vec::new();
    let mut overrides: Vec<(Xid, Rect)> = Vec::new();

    for id in &all_ids {
        let Some(w) = registry.window(*id) else { continue };
        let mask = w.mask();
        if mask.contains(WindowMask::ROOT_FULLSCREEN) {
            overrides.push((*id, root));
        } else if mask.contains(WindowMask::FULLSCREEN) {
            overrides.push((*id, base));
        } else if mask.contains(WindowMask::NO_TILE) || mask.contains(WindowMask::FLOATING) {
            // left alone entirely
        } else {
            tileable.push(*id);
        }
    }

    let placements: Vec<Placement> = match registry.workspace(wix).unwrap().active_layout() {
        Some(layout) => layout.arrange(&tileable, viewport),
        None => Vec::new(),
    };

    for (id, region) in overrides.into_iter().chain(placements.into_iter().map(|p| (p.id, p.region))) {
        let border = registry.window(id).map(|w| w.border()).unwrap_or(0);
        match conn.configure_window(id, region, border) {
            Ok(()) => {
                if let Some(w) = registry.window_mut(id) {
                    w.force_set_geometry(region);
                    w.transient_failure = false;
                }
            }
            Err(e) => {
                warn!(window = *id, error = %e, "configure request failed during tiling");
                if let Some(w) = registry.window_mut(id) {
                    w.transient_failure = true;
                }
            }
        }
    }

    Ok(())
}

/// Catch the server's mapped state up to each window's wanted state on `wix`, per the
/// `WINDOW_CHANGE` bit raised by [TileState::update_state]. Issues `map_window` for
/// windows that should now be visible and `unmap_window` for ones that shouldn't,
/// updating the `MAPPED` bit so the next signature comparison sees a settled state.
pub fn apply_map_changes<X: XConn>(conn: &X, registry: &mut Registry, wix: usize) -> Result<()> {
    let Some(ws) = registry.workspace(wix) else {
        return Ok(());
    };
    let ids: Vec<Xid> = ws.window_ids().collect();
    for id in ids {
        let Some(w) = registry.window(id) else { continue };
        let want = wants_mapped(w);
        let have = w.mask().contains(WindowMask::MAPPED);
        if want == have {
            continue;
        }
        let result = if want { conn.map_window(id) } else { conn.unmap_window(id) };
        match result {
            Ok(()) => {
                if let Some(w) = registry.window_mut(id) {
                    if want {
                        w.insert_mask(WindowMask::MAPPED);
                    } else {
                        w.remove_mask(WindowMask::MAPPED);
                    }
                }
            }
            Err(e) => {
                warn!(window = *id, error = %e, want_mapped = want, "map/unmap request failed");
            }
        }
    }
    Ok(())
}
