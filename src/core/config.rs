//! User facing configuration of [crate::core::world::World].
use crate::core::data_types::WindowMask;
use crate::core::layout::{monocle, Layout, LayoutArgs};
use std::fmt;

/// How [crate::core::registry::Registry::assign_free_monitors] orders candidate
/// monitors when more than one is free for the same workspace slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorDuplicationPolicy {
    /// Prefer the primary output; among non-primary candidates, prefer the lowest id.
    PreferPrimary,
    /// Ignore primary-ness entirely; always prefer the lowest id.
    PreferById,
}

/// The main user-facing configuration surface.
///
/// `X` only shows up here because the startup/event/manage/refresh hooks are typed
/// over the connection; kept as a type parameter on `Config` itself rather than a
/// separate wrapper so callers build one generic struct instead of two.
pub struct Config<X> {
    /// Default workspace names. Must have at least one element.
    pub workspaces: Vec<String>,
    /// `WM_CLASS` values that are always floated rather than tiled.
    pub floating_classes: Vec<String>,
    /// Default layouts given to every workspace.
    pub layouts: Vec<Layout>,
    pub focused_border: u32,
    pub unfocused_border: u32,
    pub border_px: u32,
    pub gap_px: u32,
    /// If set, an unhandled X error (kind-0 rule) aborts the event loop instead of
    /// being logged and continuing.
    pub crash_on_errors: bool,
    /// If set, the engine attempts to take ownership of the `WM_Sn` selection at
    /// startup rather than assuming no other window manager is running.
    pub steal_wm_selection: bool,
    /// The `SRC_INDICATION` value used on synthetic client messages this crate sends.
    pub src_indication_mask: u32,
    /// The subset of [WindowMask] flags mirrored into `_NET_WM_STATE` by
    /// [crate::core::protocol::sync_window_state]. Flags with no EWMH state
    /// equivalent (e.g. `FLOATING`) are silently dropped even if included here.
    pub masks_to_sync: WindowMask,
    /// Modifier bits ignored when matching bindings (typically numlock/capslock).
    pub ignore_mods: u16,
    /// Tie-breaking policy used by [crate::core::registry::Registry::assign_free_monitors]
    /// when more than one monitor is free for the same unassigned workspace.
    pub monitor_duplication_policy: MonitorDuplicationPolicy,
    /// How long the pump polls between non-blocking reads before going idle, in ms.
    pub idle_poll_ms: u64,
    /// Grace period with no new events required before `TrueIdle` fires, in ms.
    pub idle_grace_ms: u64,
    /// Maximum rule/binding re-entrancy depth.
    pub max_rule_reentry_depth: u32,
    /// Path used to persist MPX hierarchy state across restarts, if any.
    pub persisted_state_path: Option<String>,
    /// Number of idle cycles between runs of the periodic registry validator. `0`
    /// disables the validator entirely.
    pub integrity_check_every_idle_cycles: u32,
    /// If set, a failed integrity check aborts the event loop (development mode)
    /// instead of clearing the offending reference and continuing.
    pub abort_on_integrity_violation: bool,
    startup_hook: Option<Box<dyn FnMut(&mut crate::core::world::World<X>) -> crate::error::Result<()>>>,
}

impl<X> fmt::Debug for Config<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("workspaces", &self.workspaces)
            .field("floating_classes", &self.floating_classes)
            .field("focused_border", &self.focused_border)
            .field("unfocused_border", &self.unfocused_border)
            .field("border_px", &self.border_px)
            .field("gap_px", &self.gap_px)
            .field("crash_on_errors", &self.crash_on_errors)
            .field("steal_wm_selection", &self.steal_wm_selection)
            .field("idle_poll_ms", &self.idle_poll_ms)
            .field("idle_grace_ms", &self.idle_grace_ms)
            .field("max_rule_reentry_depth", &self.max_rule_reentry_depth)
            .field("persisted_state_path", &self.persisted_state_path)
            .field(
                "integrity_check_every_idle_cycles",
                &self.integrity_check_every_idle_cycles,
            )
            .field("abort_on_integrity_violation", &self.abort_on_integrity_violation)
            .finish()
    }
}

impl<X> Default for Config<X> {
    fn default() -> Self {
        Self {
            workspaces: (1..=9).map(|n| n.to_string()).collect(),
            floating_classes: ["dmenu", "dunst"].iter().map(|s| s.to_string()).collect(),
            layouts: vec![Layout::new("[]=", monocle, LayoutArgs::default())],
            focused_border: 0xcc241d,
            unfocused_border: 0x3c3836,
            border_px: 2,
            gap_px: 0,
            crash_on_errors: false,
            steal_wm_selection: false,
            src_indication_mask: 2,
            masks_to_sync: WindowMask::FLOATING
                | WindowMask::FULLSCREEN
                | WindowMask::STICKY
                | WindowMask::ABOVE
                | WindowMask::BELOW,
            ignore_mods: 0,
            monitor_duplication_policy: MonitorDuplicationPolicy::PreferPrimary,
            idle_poll_ms: 10,
            idle_grace_ms: 50,
            max_rule_reentry_depth: 8,
            persisted_state_path: None,
            integrity_check_every_idle_cycles: 200,
            abort_on_integrity_violation: false,
            startup_hook: None,
        }
    }
}

impl<X> Config<X> {
    /// Set the workspaces field on this [Config].
    pub fn workspaces(&mut self, val: Vec<impl Into<String>>) -> &mut Self {
        self.workspaces = val.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Set the floating_classes field on this [Config].
    pub fn floating_classes(&mut self, val: Vec<impl Into<String>>) -> &mut Self {
        self.floating_classes = val.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Set the layouts field on this [Config].
    pub fn layouts(&mut self, val: Vec<Layout>) -> &mut Self {
        self.layouts = val;
        self
    }

    /// Compose `hook` with any existing startup hook, running the existing one first.
    pub fn compose_or_set_startup_hook(
        &mut self,
        mut hook: impl FnMut(&mut crate::core::world::World<X>) -> crate::error::Result<()> + 'static,
    ) -> &mut Self
    where
        X: 'static,
    {
        let existing = self.startup_hook.take();
        self.startup_hook = Some(Box::new(move |world| {
            if let Some(existing) = existing.as_mut() {
                existing(world)?;
            }
            hook(world)
        }));
        self
    }

    pub(crate) fn take_startup_hook(
        &mut self,
    ) -> Option<Box<dyn FnMut(&mut crate::core::world::World<X>) -> crate::error::Result<()>>> {
        self.startup_hook.take()
    }
}
