//! [World] is the single piece of mutable state a running window manager owns: the X
//! connection, configuration, entity [Registry], rule table, binding/chain table, tile
//! driver and hooks. Every rule closure and binding closure is handed `&mut World<X>`,
//! so this module is where the other `core` modules are wired together into something
//! that can actually answer X events.
use std::collections::HashMap;
use std::mem;

use tracing::{debug, trace, warn};

use crate::core::bindings::{
    Binding, BindingContext, BindingDetail, BindingFlags, BindingId, BindingTarget, KeyCode,
    MouseEvent, MouseEventKind, MouseState, PassThrough as BindingPassThrough,
};
use crate::core::config::Config;
use crate::core::data_types::{Direction, Rect, WindowMask};
use crate::core::dock;
use crate::core::engine::{EventKind, RuleTable};
use crate::core::focus;
use crate::core::hooks::{Hook, Hooks};
use crate::core::ids::{MasterId, SlaveId, Xid};
use crate::core::master::{ChainScope, Color, Master};
use crate::core::protocol::{
    acquire_wm_selection, advertise_ewmh_support, apply_registry_action, parse_client_message,
    sync_root_properties, sync_window_desktop, sync_window_state, ProtocolAction,
};
use crate::core::registry::Registry;
use crate::core::slave::{Slave, SlaveKind};
use crate::core::tiling::{self, TileState};
use crate::core::window::Window;
use crate::core::xconnection::{Atom, XConn, XEvent};
use crate::error::{Error, Result};

/// What triggered this round of binding dispatch: a key press or a mouse button press.
/// Held separately from [BindingDetail] so callers don't have to fabricate a fake
/// modifier mask just to compare a mouse click against it.
enum Trigger {
    Key(KeyCode),
    Mouse(MouseState),
}

fn detail_matches(detail: &BindingDetail, trigger: &Trigger, ignore_mods: u16) -> bool {
    match (detail, trigger) {
        (BindingDetail::Key(bound), Trigger::Key(pressed)) => {
            bound.ignoring_modifier(ignore_mods) == pressed.ignoring_modifier(ignore_mods)
        }
        (BindingDetail::Mouse(bound), Trigger::Mouse(pressed)) => bound == pressed,
        _ => false,
    }
}

/// Walk `path` (a sequence of child indices from the root) down into `bindings` and
/// return the node it names, or `None` if the path no longer resolves (a binding was
/// removed out from under an open chain).
fn resolve_node_mut<'a, X>(
    bindings: &'a mut [Binding<World<X>>],
    path: &[usize],
) -> Option<&'a mut Binding<World<X>>>
where
    X: XConn,
{
    let (&first, rest) = path.split_first()?;
    let node = bindings.get_mut(first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        resolve_node_mut(&mut node.children, rest)
    }
}

/// The list of bindings currently live for a master: either the root table, or the
/// children of whatever binding opened its active chain scope.
fn chain_children_mut<X>(
    bindings: &mut Vec<Binding<World<X>>>,
    chain_path: Option<&[usize]>,
) -> &mut Vec<Binding<World<X>>>
where
    X: XConn,
{
    let Some(path) = chain_path else {
        return bindings;
    };
    match resolve_node_mut(bindings.as_mut_slice(), path) {
        Some(node) => &mut node.children,
        None => bindings,
    }
}

/// Central control-plane state for a running window manager: the X connection, the
/// entity [Registry], the rule and binding tables, the tile driver and installed
/// [Hook]s.
///
/// `World` is only ever accessed from the single thread running [World::run_event_loop];
/// helper threads (a status bar refresher, an IPC listener) are expected to communicate
/// with it by sending messages that get drained from inside the event loop rather than
/// reaching into a `World` directly, since nothing here is `Sync`.
pub struct World<X>
where
    X: XConn,
{
    conn: X,
    config: Config<X>,
    registry: Registry,
    rules: RuleTable<World<X>>,
    bindings: Vec<Binding<World<X>>>,
    binding_paths: HashMap<BindingId, Vec<usize>>,
    path_ids: HashMap<Vec<usize>, BindingId>,
    next_binding_id: u32,
    tile_state: TileState,
    hooks: Hooks<X>,
    root: Xid,
    shutting_down: bool,
    last_key: Option<(MasterId, KeyCode)>,
    idle_cycles: u32,
    /// Mirrors `_NET_SHOWING_DESKTOP`: when set, every non-dock window is unmapped
    /// rather than removed from the registry.
    showing_desktop: bool,
}

impl<X> World<X>
where
    X: XConn,
{
    pub fn new(conn: X, config: Config<X>) -> Self {
        let registry = Registry::new(&config.workspaces, config.layouts.clone());
        let root = conn.root();
        let max_reentry = config.max_rule_reentry_depth;

        Self {
            conn,
            config,
            registry,
            rules: RuleTable::new(max_reentry),
            bindings: Vec::new(),
            binding_paths: HashMap::new(),
            path_ids: HashMap::new(),
            next_binding_id: 1,
            tile_state: TileState::new(),
            hooks: Vec::new(),
            root,
            shutting_down: false,
            last_key: None,
            idle_cycles: 0,
            showing_desktop: false,
        }
    }

    pub fn conn(&self) -> &X {
        &self.conn
    }

    pub fn config(&self) -> &Config<X> {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config<X> {
        &mut self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn root(&self) -> Xid {
        self.root
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    pub fn quit(&mut self) {
        self.shutting_down = true;
    }

    /// Request a restart: identical to [World::quit] from the event loop's point of view.
    /// What differs is left to the process supervisor: a caller that wraps
    /// [World::run_event_loop] in a loop and re-execs on a non-zero exit code gets a
    /// restart for free, without this module needing to know how the binary was
    /// launched.
    pub fn restart(&mut self) {
        self.shutting_down = true;
    }

    pub fn add_hook(&mut self, hook: Box<dyn Hook<X>>) {
        self.hooks.push(hook);
    }

    // -- rule table --------------------------------------------------------------

    pub fn add_rule(
        &mut self,
        kind: EventKind,
        insert: crate::core::engine::InsertMode,
        rule: crate::core::engine::Rule<World<X>>,
    ) {
        self.rules.add_rule(kind, insert, rule)
    }

    pub fn add_batched_rule(
        &mut self,
        kind: EventKind,
        insert: crate::core::engine::InsertMode,
        rule: crate::core::engine::Rule<World<X>>,
    ) {
        self.rules.add_batched_rule(kind, insert, rule)
    }

    /// Run every rule registered for `kind` against this world. Rules are temporarily
    /// taken out of `self` so that a rule calling back into [World::dispatch_rule] (or
    /// anything else that touches `self.rules`) doesn't alias it; see
    /// [crate::core::engine::RuleTable::apply_inner] for the underlying mechanism.
    pub fn dispatch_rule(&mut self, kind: EventKind, win: Option<Xid>) -> Result<bool> {
        let mut rules = mem::take(&mut self.rules);
        let result = rules.apply(self, kind, win);
        self.rules = rules;
        result
    }

    pub fn flush_batched_rules(&mut self, kind: EventKind) -> Result<()> {
        let mut rules = mem::take(&mut self.rules);
        let result = rules.flush_batched(self, kind);
        self.rules = rules;
        result
    }

    // -- binding / chain table -----------------------------------------------------

    /// Register a top level key or mouse binding, returning the id used to later
    /// attach children to it with [World::add_child_binding].
    pub fn register_binding(&mut self, binding: Binding<World<X>>) -> BindingId {
        let index = self.bindings.len();
        self.bindings.push(binding);
        let path = vec![index];
        self.alloc_binding_id(path)
    }

    /// Attach `binding` as a child of `parent`, turning `parent` into the root of a
    /// chain scope the next time it fires.
    pub fn add_child_binding(
        &mut self,
        parent: BindingId,
        binding: Binding<World<X>>,
    ) -> Result<BindingId> {
        let parent_path = self
            .binding_paths
            .get(&parent)
            .cloned()
            .ok_or(Error::UnknownId { kind: "binding", id: parent.0 })?;
        let node = resolve_node_mut(self.bindings.as_mut_slice(), &parent_path)
            .ok_or(Error::UnknownId { kind: "binding", id: parent.0 })?;
        let child_index = node.children.len();
        node.children.push(binding);

        let mut path = parent_path;
        path.push(child_index);
        Ok(self.alloc_binding_id(path))
    }

    fn alloc_binding_id(&mut self, path: Vec<usize>) -> BindingId {
        let id = BindingId(self.next_binding_id);
        self.next_binding_id += 1;
        self.binding_paths.insert(id, path.clone());
        self.path_ids.insert(path, id);
        id
    }

    /// Grab every registered top level key binding for every currently known master.
    /// Mouse bindings are grabbed lazily by button press rather than up front, matching
    /// the transport's own button-grab model.
    fn grab_bindings(&self) -> Result<()> {
        let masters: Vec<MasterId> = self.registry.master_ids().collect();
        for binding in &self.bindings {
            if let BindingDetail::Key(code) = binding.detail {
                for &master in &masters {
                    self.conn.grab_key(master, self.root, code)?;
                }
            }
        }
        Ok(())
    }

    fn dispatch_key_binding(&mut self, master: MasterId, code: KeyCode) -> Result<bool> {
        let repeat = self.last_key == Some((master, code));
        self.last_key = Some((master, code));
        self.dispatch_binding(master, Trigger::Key(code), repeat)
    }

    fn dispatch_mouse_binding(&mut self, master: MasterId, state: MouseState) -> Result<bool> {
        self.last_key = None;
        self.dispatch_binding(master, Trigger::Mouse(state), false)
    }

    /// Scan `list` in order for candidates whose detail, mode and repeat-filter allow
    /// them to fire, running each one via its pass-through tag exactly like
    /// [crate::core::engine::RuleTable::apply]: `Always` keeps scanning past the match
    /// (so more than one binding in a list can fire for a single event), anything else
    /// stops. Returns the last binding fired (if any) as `(index, result,
    /// opened_child_scope, pops_chain)`.
    fn fire_matching_bindings(
        &mut self,
        list: &mut [Binding<World<X>>],
        master: MasterId,
        mode: u32,
        trigger: &Trigger,
        repeat: bool,
        ignore_mods: u16,
    ) -> Result<Option<(usize, bool, bool, bool)>> {
        let mut matched = None;
        let mut i = 0;
        while i < list.len() {
            let is_candidate = {
                let b = &list[i];
                (!repeat || !b.flags.contains(BindingFlags::FILTER_KEY_REPEAT))
                    && b.mode.map_or(true, |m| m == mode)
                    && detail_matches(&b.detail, trigger, ignore_mods)
            };
            if !is_candidate {
                i += 1;
                continue;
            }

            let target = match list[i].target {
                BindingTarget::Focused => focus::focused_window(&self.registry, master),
                BindingTarget::EventTarget | BindingTarget::None => None,
            };
            let ctx = BindingContext { master, target };
            let result = (list[i].func)(self, &ctx)?;
            matched = Some((
                i,
                result,
                !list[i].children.is_empty(),
                list[i].flags.contains(BindingFlags::POPS_CHAIN),
            ));

            let short_circuits = list[i].flags.contains(BindingFlags::SHORT_CIRCUITS);
            let keep_scanning = !short_circuits
                && match list[i].pass_through {
                    BindingPassThrough::Always => true,
                    BindingPassThrough::IfTrue => result,
                    BindingPassThrough::IfFalse => !result,
                    BindingPassThrough::Never => false,
                };
            if !keep_scanning {
                break;
            }
            i += 1;
        }
        Ok(matched)
    }

    /// The heart of the chain/binding state machine. The active chain scope for
    /// `master` (if any) is consulted first; if nothing in it matches, the global
    /// device-binding set (the root binding table) is consulted. The matched binding
    /// (wherever it came from) then opens or pops a chain scope based on whether it
    /// carries children or the `POPS_CHAIN` flag; a non-chain binding firing out of the
    /// global set while a chain scope is open still pops that scope unless it opted
    /// into `noEndOnPassThrough`, same as a key that matched nothing at all.
    fn dispatch_binding(&mut self, master: MasterId, trigger: Trigger, repeat: bool) -> Result<bool> {
        let ignore_mods = self.config.ignore_mods;
        let mode = self.registry.master(master).map(|m| m.mode()).unwrap_or(0);
        let active_scope = self.registry.master(master).and_then(|m| m.active_chain()).cloned();
        let chain_path = active_scope
            .as_ref()
            .and_then(|scope| self.binding_paths.get(&scope.binding))
            .cloned();

        let mut bindings = mem::take(&mut self.bindings);

        let mut fired_in_chain = false;
        let mut matched = None;
        if let Some(path) = chain_path.clone() {
            let list = chain_children_mut(&mut bindings, Some(&path));
            matched = self.fire_matching_bindings(list, master, mode, &trigger, repeat, ignore_mods)?;
            fired_in_chain = matched.is_some();
        }
        if matched.is_none() {
            matched = self.fire_matching_bindings(&mut bindings, master, mode, &trigger, repeat, ignore_mods)?;
        }

        self.bindings = bindings;

        let base_path = if fired_in_chain { chain_path.clone().unwrap_or_default() } else { Vec::new() };

        let handled = match matched {
            Some((idx, result, opened_child_scope, pops_chain)) => {
                let mut fired_path = base_path.clone();
                fired_path.push(idx);
                if let Some(&id) = self.path_ids.get(&fired_path) {
                    if let Some(m) = self.registry.master_mut(master) {
                        m.set_last_binding_triggered(id);
                    }
                }
                if pops_chain {
                    self.pop_chain(master)?;
                } else if opened_child_scope {
                    let mut path = base_path;
                    path.push(idx);
                    self.open_chain(master, path)?;
                } else if !fired_in_chain {
                    // A binding from the global set fired while a chain scope was open:
                    // the chain still ends here unless it opted into `noEndOnPassThrough`.
                    if let Some(scope) = &active_scope {
                        if scope.ends_on_pass_through {
                            self.pop_chain(master)?;
                        }
                    }
                }
                result
            }
            None => {
                if let Some(scope) = active_scope {
                    if scope.ends_on_pass_through {
                        self.pop_chain(master)?;
                    }
                }
                false
            }
        };

        Ok(handled)
    }

    fn open_chain(&mut self, master: MasterId, path: Vec<usize>) -> Result<()> {
        let binding = self.path_ids.get(&path).copied().unwrap_or(BindingId(0));
        let (whole_device, ends_on_pass_through) = {
            let node = resolve_node_mut(self.bindings.as_mut_slice(), &path);
            match node {
                Some(n) => (
                    !n.flags.contains(BindingFlags::NO_GRAB),
                    n.pass_through != BindingPassThrough::Always,
                ),
                None => (true, true),
            }
        };

        if whole_device {
            self.conn.grab_device(master)?;
        }
        if let Some(m) = self.registry.master_mut(master) {
            m.chain_stack.push(ChainScope {
                binding,
                whole_device_grabbed: whole_device,
                ends_on_pass_through,
            });
        }
        Ok(())
    }

    fn pop_chain(&mut self, master: MasterId) -> Result<()> {
        let popped = self.registry.master_mut(master).and_then(|m| m.chain_stack.pop());
        if let Some(scope) = popped {
            if scope.whole_device_grabbed {
                self.conn.ungrab_device(master)?;
            }
        }
        Ok(())
    }

    // -- lifecycle -------------------------------------------------------------

    /// Seed the registry from the transport's current view of monitors, masters and
    /// slaves, advertise EWMH support, grab the configured bindings and run any
    /// startup hook and [Hook::startup] implementations. Called once before
    /// [World::run_event_loop].
    pub fn on_startup(&mut self) -> Result<()> {
        trace!("registering SIGCHLD signal handler");
        if let Err(e) = unsafe { nix::sys::signal::signal(nix::sys::signal::Signal::SIGCHLD, nix::sys::signal::SigHandler::SigIgn) } {
            warn!(%e, "unable to set SIGCHLD handler");
        }

        for monitor in self.conn.current_monitors()? {
            self.registry.insert_monitor(monitor)?;
        }
        self.registry.assign_free_monitors(self.config.monitor_duplication_policy);
        for master in self.conn.current_masters()? {
            self.registry.insert_master(master)?;
        }
        for slave in self.conn.current_slaves()? {
            self.registry.insert_slave(slave)?;
        }

        if let Some(path) = self.config.persisted_state_path.clone() {
            match crate::persist::load(&path) {
                Ok(records) => crate::persist::apply(&mut self.registry, &records),
                Err(e) => warn!(%e, "failed to load persisted MPX state"),
            }
        }

        if self.config.steal_wm_selection {
            acquire_wm_selection(&self.conn, 0)?;
        }
        advertise_ewmh_support(&self.conn, self.root)?;
        self.sync_root_state(None)?;

        self.grab_bindings()?;

        if let Some(mut hook) = self.config.take_startup_hook() {
            hook(self)?;
        }

        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.startup(self)?;
        }
        self.hooks = hooks;

        self.tile_state.mark_state(&self.registry);
        self.retile_all()?;
        Ok(())
    }

    /// Drive the event pump until [World::quit] or [World::restart] is called.
    pub fn run_event_loop(&mut self) -> Result<()> {
        crate::core::pump::run(self)
    }

    /// Poll the transport for the next event without blocking.
    pub fn poll_event(&self) -> Result<Option<XEvent>> {
        self.conn.poll_for_event()
    }

    pub fn flush_conn(&self) {
        self.conn.flush();
    }

    pub fn idle_poll_ms(&self) -> u64 {
        self.config.idle_poll_ms
    }

    pub fn idle_grace_ms(&self) -> u64 {
        self.config.idle_grace_ms
    }

    pub fn crash_on_errors(&self) -> bool {
        self.config.crash_on_errors
    }

    /// Free every registry in dependency order (windows, then monitors, then masters)
    /// and persist MPX state if configured. Workspaces and slaves have no standalone
    /// lifetime outside the registry and monitors/masters that own them, so they are
    /// dropped along with it rather than torn down individually.
    pub fn shutdown(&mut self) -> Result<()> {
        debug!("shutting down");

        if let Some(path) = self.config.persisted_state_path.clone() {
            if let Err(e) = crate::persist::save(&path, &self.registry) {
                warn!(%e, "failed to persist MPX state");
            }
        }

        for id in self.registry.window_ids().collect::<Vec<_>>() {
            self.registry.remove_window(id);
        }
        for id in self.registry.monitors().map(|m| m.id()).collect::<Vec<_>>() {
            self.registry.remove_monitor(id);
        }
        for id in self.registry.master_ids().collect::<Vec<_>>() {
            self.registry.remove_master(id);
        }
        self.conn.flush();
        Ok(())
    }

    // -- event handling ----------------------------------------------------------

    pub fn handle_event(&mut self, event: XEvent) -> Result<()> {
        match event {
            XEvent::KeyPress { master, code, synthetic: _ } => self.on_key_press(master, code)?,
            XEvent::MouseEvent { master, event, synthetic } => {
                self.on_mouse_event(master, event, synthetic)?
            }
            XEvent::MapRequest { id, ignore } => self.on_map_request(id, ignore)?,
            XEvent::Enter { master, id, rpt, wpt: _ } => self.on_enter(master, id, rpt)?,
            XEvent::Leave { master, id, rpt, wpt: _ } => self.on_leave(master, id, rpt)?,
            XEvent::Destroy { id } => self.on_destroy(id)?,
            XEvent::ConfigureNotify { id, r, is_root } => self.on_configure_notify(id, r, is_root)?,
            XEvent::ConfigureRequest { id, r } => self.on_configure_request(id, r)?,
            XEvent::PropertyNotify { id, atom, is_root } => {
                self.on_property_notify(id, atom, is_root)?
            }
            XEvent::ClientMessage { id, dtype, data } => self.on_client_message(id, dtype, data)?,
            XEvent::ScreenChange | XEvent::RandrNotify => self.on_screen_change()?,
            XEvent::MasterAdded { id, keyboard, pointer } => {
                self.on_master_added(id, keyboard, pointer)?
            }
            XEvent::MasterRemoved { id } => self.on_master_removed(id)?,
            XEvent::SlaveAttachmentChanged { id, master } => {
                self.on_slave_attachment_changed(id, master)?
            }
            XEvent::SlaveAdded { id, master } => self.on_slave_added(id, master)?,
            XEvent::SlaveRemoved { id } => self.on_slave_removed(id)?,
        }

        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.event_handled(self)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn on_key_press(&mut self, master: MasterId, code: KeyCode) -> Result<()> {
        // `dispatch_rule` returns `true` when the `KeyPress` rule list ran to
        // completion (no rule claimed the event via `PassThrough::No`), in which case
        // the binding/chain state machine still gets a turn at it.
        let handled = self.dispatch_rule(EventKind::KeyPress, None)?;
        if handled {
            self.dispatch_key_binding(master, code)?;
        }
        Ok(())
    }

    fn on_mouse_event(&mut self, master: MasterId, event: MouseEvent, _synthetic: bool) -> Result<()> {
        let kind = match event.kind {
            MouseEventKind::Press => EventKind::ButtonPress,
            MouseEventKind::Release => EventKind::ButtonRelease,
            MouseEventKind::Motion => EventKind::MotionNotify,
        };
        if let Some(m) = self.registry.master_mut(master) {
            m.set_last_pointer_position(event.rpt);
        }
        // Same pass-through convention as `on_key_press`: only fall through to the
        // binding/chain state machine when no rule claimed the event outright.
        let handled = self.dispatch_rule(kind, Some(event.id))?;
        if handled && matches!(event.kind, MouseEventKind::Press) {
            self.dispatch_mouse_binding(master, event.state.clone())?;
        }
        Ok(())
    }

    fn on_map_request(&mut self, id: Xid, ignore: bool) -> Result<()> {
        if ignore {
            return Ok(());
        }
        self.dispatch_rule(EventKind::PreRegisterWindow, Some(id))?;

        let window = Window::new(id, None, Rect::default(), self.config.border_px);
        self.registry.insert_window(window)?;

        self.dispatch_rule(EventKind::PostRegisterWindow, Some(id))?;

        let wix = self.target_workspace_for_new_window();
        self.registry.move_to_workspace(id, Some(wix))?;
        self.run_window_added_hooks(id, wix)?;

        self.dispatch_rule(EventKind::ClientMapAllow, Some(id))?;

        self.conn.map_window(id)?;
        if let Some(w) = self.registry.window_mut(id) {
            w.insert_mask(WindowMask::MAPPED);
        }
        if let Some(mask) = self.registry.window(id).map(|w| w.mask()) {
            sync_window_state(&self.conn, id, mask, self.config.masks_to_sync)?;
        }
        let workspace_count = self.registry.workspaces().len();
        sync_window_desktop(&self.conn, id, wix, workspace_count)?;
        self.run_new_window_hooks(id)?;
        self.retile_workspace(wix)?;
        self.sync_root_state(None)?;
        Ok(())
    }

    fn target_workspace_for_new_window(&self) -> usize {
        self.registry
            .master(crate::core::ids::DEFAULT_MASTER)
            .or_else(|| self.registry.masters().next())
            .map(|m| m.active_workspace())
            .unwrap_or(0)
    }

    fn on_destroy(&mut self, id: Xid) -> Result<()> {
        let wix = self.registry.window(id).and_then(|w| w.workspace());
        self.run_remove_window_hooks(id)?;
        self.registry.remove_window(id);
        self.dispatch_rule(EventKind::DestroyNotify, Some(id))?;
        if let Some(wix) = wix {
            self.retile_workspace(wix)?;
        }
        self.sync_root_state(None)?;
        Ok(())
    }

    fn on_configure_notify(&mut self, id: Xid, r: Rect, is_root: bool) -> Result<()> {
        if is_root {
            return self.on_screen_change();
        }
        if let Some(w) = self.registry.window_mut(id) {
            w.set_geometry(r);
        }
        self.dispatch_rule(EventKind::ConfigureNotify, Some(id))?;
        Ok(())
    }

    fn on_configure_request(&mut self, id: Xid, r: Rect) -> Result<()> {
        let locked = self.registry.window(id).map(|w| w.geometry_locked()).unwrap_or(false);
        if !locked {
            let border = self.registry.window(id).map(|w| w.border()).unwrap_or(self.config.border_px);
            self.conn.configure_window(id, r, border)?;
            if let Some(w) = self.registry.window_mut(id) {
                w.force_set_geometry(r);
            }
        }
        self.dispatch_rule(EventKind::OnWindowMove, Some(id))?;
        Ok(())
    }

    fn on_property_notify(&mut self, id: Xid, atom: String, _is_root: bool) -> Result<()> {
        if atom == "WM_NAME" || atom == "_NET_WM_NAME" {
            if let Ok(name) = self.conn.get_str_prop(id, Atom::NetWmName) {
                if let Some(w) = self.registry.window_mut(id) {
                    w.set_name(name);
                }
            }
        }
        self.dispatch_rule(EventKind::PropertyLoad, Some(id))?;
        Ok(())
    }

    fn on_client_message(&mut self, id: Xid, dtype: String, data: Vec<usize>) -> Result<()> {
        if let Some(action) = parse_client_message(id, &dtype, &data, self.config.src_indication_mask) {
            match &action {
                ProtocolAction::CloseWindow(target) => {
                    self.conn.send_client_message(*target, Atom::WmDeleteWindow)?;
                }
                ProtocolAction::SetActiveWindow(target) => {
                    if let Some(master) = self.registry.master_ids().next() {
                        self.focus_window_for_master(master, *target)?;
                    }
                }
                ProtocolAction::SetCurrentDesktop(wix) => {
                    if let Some(master) = self.registry.master_ids().next() {
                        self.switch_workspace(master, *wix)?;
                    }
                }
                ProtocolAction::SetShowingDesktop(flag) => {
                    self.set_showing_desktop(*flag)?;
                }
                ProtocolAction::SetNumberOfDesktops(n) => {
                    let n = (*n).max(1);
                    self.registry.set_workspace_count(n, self.config.layouts.clone());
                    self.retile_all()?;
                    self.sync_root_state(None)?;
                }
                ProtocolAction::WindowToDesktop(target, wix) => {
                    let count = self.registry.workspaces().len();
                    sync_window_desktop(&self.conn, *target, *wix, count)?;
                }
                ProtocolAction::RequestFrameExtents(target) => {
                    let border = self.config.border_px;
                    self.conn.change_prop(
                        *target,
                        Atom::NetFrameExtents,
                        &[border, border, border, border],
                    )?;
                }
                ProtocolAction::BeginInteractiveMoveResize(_) => {
                    // tracking the follow-up pointer motion into a live geometry update
                    // would need a dedicated drag-state machine fed by MotionNotify;
                    // out of scope for the control plane this crate implements (see
                    // DESIGN.md)
                }
                ProtocolAction::MoveResizeWindow(target, r) => {
                    let locked = self.registry.window(*target).map(|w| w.geometry_locked()).unwrap_or(true);
                    if !locked {
                        let border = self.registry.window(*target).map(|w| w.border()).unwrap_or(self.config.border_px);
                        self.conn.configure_window(*target, *r, border)?;
                    }
                }
                _ => {}
            }
            apply_registry_action(&mut self.registry, &action)?;
            if let ProtocolAction::SetWindowState { id: target, .. } = &action {
                if let Some(mask) = self.registry.window(*target).map(|w| w.mask()) {
                    sync_window_state(&self.conn, *target, mask, self.config.masks_to_sync)?;
                }
            }
        }
        self.dispatch_rule(EventKind::ClientMessage, Some(id))?;
        Ok(())
    }

    fn on_enter(&mut self, master: MasterId, id: Xid, rpt: crate::core::data_types::Point) -> Result<()> {
        if let Some(m) = self.registry.master_mut(master) {
            m.set_last_pointer_position(rpt);
        }
        focus::focus_window(&mut self.registry, master, id);
        self.run_focus_change_hooks(master, id)?;
        self.sync_root_state(Some(master))?;
        self.dispatch_rule(EventKind::EnterNotify, Some(id))?;
        Ok(())
    }

    fn on_leave(&mut self, master: MasterId, id: Xid, rpt: crate::core::data_types::Point) -> Result<()> {
        if let Some(m) = self.registry.master_mut(master) {
            m.set_last_pointer_position(rpt);
        }
        self.dispatch_rule(EventKind::LeaveNotify, Some(id))?;
        Ok(())
    }

    fn on_screen_change(&mut self) -> Result<()> {
        let monitors = self.conn.current_monitors()?;
        let seen: Vec<crate::core::ids::MonitorId> = monitors.iter().map(|m| m.id()).collect();
        for m in &monitors {
            if self.registry.monitor(m.id()).is_none() {
                self.registry.insert_monitor(*m)?;
            } else if let Some(existing) = self.registry.monitor_mut(m.id()) {
                existing.set_base(m.base(), &[]);
            }
        }
        for gone in self
            .registry
            .monitors()
            .map(|m| m.id())
            .filter(|id| !seen.contains(id))
            .collect::<Vec<_>>()
        {
            self.registry.remove_monitor(gone);
        }
        dock::recompute_all_viewports(&mut self.registry);
        // Workspaces orphaned by a removed monitor (or workspaces that never had one)
        // get first claim on whatever monitors remain.
        self.registry.assign_free_monitors(self.config.monitor_duplication_policy);

        let bases: Vec<Rect> = monitors.iter().map(|m| m.base()).collect();
        self.run_monitors_updated_hooks(&bases)?;
        self.dispatch_rule(EventKind::OnScreenChange, None)?;
        self.retile_all()
    }

    fn on_master_added(&mut self, id: MasterId, keyboard: SlaveId, pointer: SlaveId) -> Result<()> {
        self.registry
            .insert_master(Master::new(id, keyboard, pointer, format!("master-{}", *id)))?;
        self.dispatch_rule(EventKind::ProcessDeviceEvent, None)?;
        Ok(())
    }

    fn on_master_removed(&mut self, id: MasterId) -> Result<()> {
        self.registry.remove_master(id);
        self.dispatch_rule(EventKind::ProcessDeviceEvent, None)?;
        Ok(())
    }

    fn on_slave_attachment_changed(&mut self, id: SlaveId, master: Option<MasterId>) -> Result<()> {
        if let Some(s) = self.registry.slave_mut(id) {
            match master {
                Some(m) => s.attach(m),
                None => s.detach(),
            }
        }
        self.dispatch_rule(EventKind::ProcessDeviceEvent, None)?;
        Ok(())
    }

    fn on_slave_added(&mut self, id: SlaveId, master: Option<MasterId>) -> Result<()> {
        // the hierarchy-changed event doesn't carry device class; a follow-up device
        // query would reclassify this as a keyboard slave if that's what it turns out to be
        let mut slave = Slave::new(id, SlaveKind::Pointer, format!("slave-{}", *id), false);
        if let Some(m) = master {
            slave.attach(m);
        }
        self.registry.insert_slave(slave)?;
        self.dispatch_rule(EventKind::ProcessDeviceEvent, None)?;
        Ok(())
    }

    fn on_slave_removed(&mut self, id: SlaveId) -> Result<()> {
        self.registry.remove_slave(id);
        self.dispatch_rule(EventKind::ProcessDeviceEvent, None)?;
        Ok(())
    }

    // -- focus / workspace / tiling helpers --------------------------------------

    pub fn focus_window_for_master(&mut self, master: MasterId, id: Xid) -> Result<()> {
        focus::focus_window(&mut self.registry, master, id);
        self.conn.focus_window(master, id)?;
        self.run_focus_change_hooks(master, id)?;
        self.sync_root_state(Some(master))?;
        Ok(())
    }

    pub fn switch_workspace(&mut self, master: MasterId, wix: usize) -> Result<()> {
        if self.registry.workspace(wix).is_none() {
            return Err(Error::UnknownId { kind: "workspace", id: wix as u32 });
        }
        if let Some(m) = self.registry.master_mut(master) {
            m.set_active_workspace(wix);
        }
        self.run_workspace_change_hooks(master, wix)?;
        self.retile_workspace(wix)?;
        self.sync_root_state(Some(master))
    }

    fn root_rect(&self) -> Rect {
        let mut monitors = self.registry.monitors().map(|m| m.base());
        let Some(first) = monitors.next() else {
            return Rect::default();
        };
        monitors.fold(first, |acc, r| {
            let x = acc.x.min(r.x);
            let y = acc.y.min(r.y);
            let right = (acc.x + acc.w as i32).max(r.x + r.w as i32);
            let bottom = (acc.y + acc.h as i32).max(r.y + r.h as i32);
            Rect::new(x, y, (right - x) as u32, (bottom - y) as u32)
        })
    }

    fn retile_workspace(&mut self, wix: usize) -> Result<()> {
        let root = self.root_rect();
        tiling::tile_workspace(&self.conn, &mut self.registry, root, wix)?;
        self.dispatch_rule(EventKind::TileWorkspace, None)?;
        self.run_layout_applied_hooks(wix)
    }

    fn retile_all(&mut self) -> Result<()> {
        let count = self.registry.workspaces().len();
        for wix in 0..count {
            self.retile_workspace(wix)?;
        }
        Ok(())
    }

    /// Run the periodic registry validator ("Integrity violation"): walk every
    /// cross-entity reference and either abort (when `Config::abort_on_integrity_violation`
    /// is set, i.e. development mode) or log and clear the offending references.
    pub fn check_integrity(&mut self) -> Result<()> {
        let problems = self.registry.check_invariants();
        if problems.is_empty() {
            return Ok(());
        }
        if self.config.abort_on_integrity_violation {
            return Err(Error::IntegrityViolation(problems.join("; ")));
        }
        warn!(count = problems.len(), first = %problems[0], "registry integrity violation, repairing");
        self.registry.repair_invariants();
        Ok(())
    }

    /// Called once per idle cycle by [crate::core::pump::run]; runs
    /// [World::check_integrity] every `Config::integrity_check_every_idle_cycles` idle
    /// ticks rather than on every single one.
    pub fn on_idle_tick(&mut self) -> Result<()> {
        let every = self.config.integrity_check_every_idle_cycles;
        if every == 0 {
            return Ok(());
        }
        self.idle_cycles = self.idle_cycles.wrapping_add(1);
        if self.idle_cycles % every == 0 {
            self.check_integrity()?;
        }
        Ok(())
    }

    /// Write the root EWMH properties this crate maintains, keyed off whichever
    /// master fires the call (or the first registered master, if any).
    pub fn sync_root_state(&mut self, master: Option<MasterId>) -> Result<()> {
        let active = master.or_else(|| self.registry.master_ids().next());
        sync_root_properties(&self.conn, &self.registry, self.root, active, self.showing_desktop)
    }

    /// `_NET_SHOWING_DESKTOP`: unmap (or remap) every non-dock window without touching
    /// the registry's notion of which windows exist or their tiling state.
    pub fn set_showing_desktop(&mut self, flag: bool) -> Result<()> {
        self.showing_desktop = flag;
        let ids: Vec<Xid> = self
            .registry
            .window_ids()
            .filter(|&id| {
                self.registry
                    .window(id)
                    .map(|w| w.strut().is_none() && w.mask().contains(WindowMask::MAPPED))
                    .unwrap_or(false)
            })
            .collect();
        for id in ids {
            if flag {
                self.conn.unmap_window(id)?;
            } else {
                self.conn.map_window(id)?;
            }
        }
        self.sync_root_state(None)
    }

    /// Retile any workspace whose window/monitor signature has drifted since the last
    /// call, driven by the periodic/idle pump rather than individual window events.
    pub fn run_tile_pass(&mut self) -> Result<()> {
        let (bits, changed) = self.tile_state.update_state(&self.registry);
        if bits.is_empty() {
            return Ok(());
        }
        for wix in changed {
            if bits.contains(tiling::ChangeBits::WINDOW_CHANGE) {
                tiling::apply_map_changes(&self.conn, &mut self.registry, wix)?;
            }
            self.retile_workspace(wix)?;
        }
        Ok(())
    }

    // -- hook plumbing ------------------------------------------------------------

    fn run_new_window_hooks(&mut self, id: Xid) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.new_window(self, id)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn run_remove_window_hooks(&mut self, id: Xid) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.remove_window(self, id)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn run_window_added_hooks(&mut self, id: Xid, wix: usize) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.window_added_to_workspace(self, id, wix)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn run_layout_applied_hooks(&mut self, wix: usize) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.layout_applied(self, wix)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn run_workspace_change_hooks(&mut self, master: MasterId, wix: usize) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.workspace_change(self, master, wix)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn run_monitors_updated_hooks(&mut self, monitors: &[Rect]) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.monitors_updated(self, monitors)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    fn run_focus_change_hooks(&mut self, master: MasterId, id: Xid) -> Result<()> {
        let mut hooks = mem::take(&mut self.hooks);
        for h in hooks.iter_mut() {
            h.focus_change(self, master, id)?;
        }
        self.hooks = hooks;
        Ok(())
    }

    // -- convenience bindings for use with run_internal! ---------------------------

    pub fn cycle_focus(&mut self, ctx: &BindingContext, direction: Direction) -> Result<bool> {
        let Some(master) = self.registry.master(ctx.master) else {
            return Ok(false);
        };
        if !master.is_frozen() {
            focus::begin_frozen_cycle(&mut self.registry, ctx.master);
        }
        focus::advance_frozen_cursor(&mut self.registry, ctx.master, direction);
        Ok(true)
    }

    pub fn commit_focus_cycle(&mut self, ctx: &BindingContext) -> Result<bool> {
        focus::end_frozen_cycle(&mut self.registry, ctx.master);
        if let Some(id) = focus::focused_window(&self.registry, ctx.master) {
            self.conn.focus_window(ctx.master, id)?;
            self.sync_root_state(Some(ctx.master))?;
        }
        Ok(true)
    }

    pub fn kill_focused(&mut self, ctx: &BindingContext) -> Result<bool> {
        let Some(id) = ctx.target.or_else(|| focus::focused_window(&self.registry, ctx.master)) else {
            return Ok(false);
        };
        self.conn.send_client_message(id, Atom::WmDeleteWindow)?;
        Ok(true)
    }

    pub fn switch_to_workspace(&mut self, ctx: &BindingContext, wix: usize) -> Result<bool> {
        self.switch_workspace(ctx.master, wix)?;
        Ok(true)
    }

    /// Cycle `master`'s active workspace through every window matching `rule`,
    /// raising and focusing the next unvisited match each call.
    pub fn find_and_raise(
        &mut self,
        ctx: &BindingContext,
        rule: impl Fn(&Window) -> bool,
    ) -> Result<bool> {
        let wix = self.registry.master(ctx.master).map(|m| m.active_workspace()).unwrap_or(0);
        let Some(id) = focus::find_and_raise(&mut self.registry, ctx.master, wix, rule) else {
            return Ok(false);
        };
        if let Some(ws) = self.registry.workspace_mut(wix) {
            ws.raise(id);
        }
        self.conn.raise_window(id, None)?;
        self.conn.focus_window(ctx.master, id)?;
        self.sync_root_state(Some(ctx.master))?;
        Ok(true)
    }

    pub fn cycle_layout(&mut self, ctx: &BindingContext, direction: Direction) -> Result<bool> {
        let wix = self.registry.master(ctx.master).map(|m| m.active_workspace()).unwrap_or(0);
        if let Some(ws) = self.registry.workspace_mut(wix) {
            ws.cycle_layout(direction);
        }
        self.retile_workspace(wix)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bindings::{BindingTarget, MouseButton, MouseState};
    use crate::core::config::Config;
    use crate::core::data_types::Point;
    use crate::core::ids::{MonitorId, DEFAULT_MASTER};
    use crate::core::layout::{monocle, Layout, LayoutArgs};
    use crate::core::master::Master;
    use crate::core::monitor::Monitor;
    use crate::core::xconnection::XConn;

    #[derive(Default, Clone)]
    struct MockConn;

    impl XConn for MockConn {
        fn poll_for_event(&self) -> Result<Option<XEvent>> {
            Ok(None)
        }
        fn root(&self) -> Xid {
            Xid::from(0)
        }
        fn current_monitors(&self) -> Result<Vec<Monitor>> {
            Ok(vec![Monitor::new(MonitorId::from(1), true, Rect::new(0, 0, 1920, 1080))])
        }
        fn current_masters(&self) -> Result<Vec<Master>> {
            Ok(vec![Master::new(DEFAULT_MASTER, SlaveId::from(2), SlaveId::from(3), "virtual core")])
        }
        fn current_slaves(&self) -> Result<Vec<Slave>> {
            Ok(vec![])
        }
        fn map_window(&self, _id: Xid) -> Result<()> {
            Ok(())
        }
        fn unmap_window(&self, _id: Xid) -> Result<()> {
            Ok(())
        }
        fn configure_window(&self, _id: Xid, _r: Rect, _border: u32) -> Result<()> {
            Ok(())
        }
        fn raise_window(&self, _id: Xid, _sibling: Option<Xid>) -> Result<()> {
            Ok(())
        }
        fn focus_window(&self, _master: MasterId, _id: Xid) -> Result<()> {
            Ok(())
        }
        fn intern_atom(&self, _name: &str) -> Result<u32> {
            Ok(0)
        }
        fn get_atom_prop(&self, _id: Xid, _prop: Atom) -> Result<Vec<u32>> {
            Ok(vec![])
        }
        fn get_str_prop(&self, _id: Xid, _prop: Atom) -> Result<String> {
            Ok(String::new())
        }
        fn change_prop(&self, _id: Xid, _prop: Atom, _value: &[u32]) -> Result<()> {
            Ok(())
        }
        fn change_text_prop(&self, _id: Xid, _prop: Atom, _value: &str) -> Result<()> {
            Ok(())
        }
        fn send_client_message(&self, _id: Xid, _proto: Atom) -> Result<()> {
            Ok(())
        }
        fn grab_key(&self, _master: MasterId, _id: Xid, _code: KeyCode) -> Result<()> {
            Ok(())
        }
        fn ungrab_key(&self, _master: MasterId, _id: Xid, _code: KeyCode) -> Result<()> {
            Ok(())
        }
        fn grab_device(&self, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn ungrab_device(&self, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn attach_slave(&self, _slave: SlaveId, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn detach_slave(&self, _slave: SlaveId) -> Result<()> {
            Ok(())
        }
        fn create_master(&self, _name: &str) -> Result<MasterId> {
            Ok(MasterId::from(99))
        }
        fn remove_master(&self, _master: MasterId) -> Result<()> {
            Ok(())
        }
        fn warp_pointer(&self, _master: MasterId, _p: Point) -> Result<()> {
            Ok(())
        }
        fn pointer_position(&self, _master: MasterId) -> Result<Point> {
            Ok(Point::new(0, 0))
        }
        fn acquire_wm_selection(&self) -> Result<()> {
            Ok(())
        }
        fn flush(&self) {}
    }

    fn test_world() -> World<MockConn> {
        let config: Config<MockConn> = Config::default();
        World::new(MockConn, config)
    }

    #[test]
    fn startup_seeds_registry_from_conn() {
        let mut world = test_world();
        world.on_startup().unwrap();
        assert_eq!(world.registry().master_ids().count(), 1);
        assert_eq!(world.registry().monitors().count(), 1);
    }

    #[test]
    fn map_request_tiles_the_window_onto_the_active_workspace() {
        let mut world = test_world();
        world.on_startup().unwrap();
        world.handle_event(XEvent::MapRequest { id: Xid::from(10), ignore: false }).unwrap();
        assert!(world.registry().window(Xid::from(10)).is_some());
        assert_eq!(world.registry().window(Xid::from(10)).unwrap().workspace(), Some(0));
    }

    #[test]
    fn destroy_removes_the_window_and_retiles() {
        let mut world = test_world();
        world.on_startup().unwrap();
        world.handle_event(XEvent::MapRequest { id: Xid::from(11), ignore: false }).unwrap();
        world.handle_event(XEvent::Destroy { id: Xid::from(11) }).unwrap();
        assert!(world.registry().window(Xid::from(11)).is_none());
    }

    #[test]
    fn key_binding_fires_on_matching_press() {
        let mut world = test_world();
        world.on_startup().unwrap();
        let code = KeyCode { mask: 0, code: 38 };
        world.register_binding(Binding {
            name: "test".into(),
            modifiers: vec![],
            detail: BindingDetail::Key(code),
            mode: None,
            target: BindingTarget::None,
            pass_through: BindingPassThrough::Never,
            flags: BindingFlags::empty(),
            children: vec![],
            func: Box::new(|w, ctx| {
                w.quit();
                let _ = ctx;
                Ok(true)
            }),
        });

        world
            .handle_event(XEvent::KeyPress { master: DEFAULT_MASTER, code, synthetic: false })
            .unwrap();
        assert!(world.is_shutting_down());
    }

    #[test]
    fn chain_binding_opens_and_closes_on_pass_through() {
        let mut world = test_world();
        world.on_startup().unwrap();
        let root_code = KeyCode { mask: 0, code: 1 };
        let child_code = KeyCode { mask: 0, code: 2 };

        let parent = world.register_binding(Binding {
            name: "chain-root".into(),
            modifiers: vec![],
            detail: BindingDetail::Key(root_code),
            mode: None,
            target: BindingTarget::None,
            pass_through: BindingPassThrough::Never,
            flags: BindingFlags::empty(),
            children: vec![],
            func: Box::new(|_, _| Ok(true)),
        });
        world
            .add_child_binding(
                parent,
                Binding {
                    name: "chain-child".into(),
                    modifiers: vec![],
                    detail: BindingDetail::Key(child_code),
                    mode: None,
                    target: BindingTarget::None,
                    pass_through: BindingPassThrough::Never,
                    flags: BindingFlags::empty(),
                    children: vec![],
                    func: Box::new(|_, _| Ok(true)),
                },
            )
            .unwrap();

        world
            .handle_event(XEvent::KeyPress { master: DEFAULT_MASTER, code: root_code, synthetic: false })
            .unwrap();
        assert!(world.registry().master(DEFAULT_MASTER).unwrap().active_chain().is_some());

        let unrelated = KeyCode { mask: 0, code: 99 };
        world
            .handle_event(XEvent::KeyPress { master: DEFAULT_MASTER, code: unrelated, synthetic: false })
            .unwrap();
        assert!(world.registry().master(DEFAULT_MASTER).unwrap().active_chain().is_none());
    }

    #[test]
    fn a_non_matching_key_inside_a_chain_falls_through_to_the_global_binding_set() {
        let mut world = test_world();
        world.on_startup().unwrap();
        let root_code = KeyCode { mask: 0, code: 1 };
        let child_code = KeyCode { mask: 0, code: 2 };
        let global_code = KeyCode { mask: 0, code: 3 };

        // A binding at the root of the table, outside the chain entirely: the global
        // device-binding set consulted once the active chain's own children fail to
        // match.
        world.register_binding(Binding {
            name: "global".into(),
            modifiers: vec![],
            detail: BindingDetail::Key(global_code),
            mode: None,
            target: BindingTarget::None,
            pass_through: BindingPassThrough::Never,
            flags: BindingFlags::empty(),
            children: vec![],
            func: Box::new(|w, _| {
                w.quit();
                Ok(true)
            }),
        });

        let parent = world.register_binding(Binding {
            name: "chain-root".into(),
            modifiers: vec![],
            detail: BindingDetail::Key(root_code),
            mode: None,
            target: BindingTarget::None,
            pass_through: BindingPassThrough::Never,
            flags: BindingFlags::empty(),
            children: vec![],
            func: Box::new(|_, _| Ok(true)),
        });
        world
            .add_child_binding(
                parent,
                Binding {
                    name: "chain-child".into(),
                    modifiers: vec![],
                    detail: BindingDetail::Key(child_code),
                    mode: None,
                    target: BindingTarget::None,
                    pass_through: BindingPassThrough::Never,
                    flags: BindingFlags::empty(),
                    children: vec![],
                    func: Box::new(|_, _| Ok(true)),
                },
            )
            .unwrap();

        world
            .handle_event(XEvent::KeyPress { master: DEFAULT_MASTER, code: root_code, synthetic: false })
            .unwrap();
        assert!(world.registry().master(DEFAULT_MASTER).unwrap().active_chain().is_some());

        // `global_code` matches neither the chain's only child (`child_code`) nor the
        // chain root itself, so it must fall through to the global set, fire "global",
        // and pop the now-exhausted chain scope.
        world
            .handle_event(XEvent::KeyPress { master: DEFAULT_MASTER, code: global_code, synthetic: false })
            .unwrap();
        assert!(world.is_shutting_down(), "the global binding must have fired");
        assert!(
            world.registry().master(DEFAULT_MASTER).unwrap().active_chain().is_none(),
            "the chain scope must pop once a global binding fires in its place"
        );
    }

    #[test]
    fn mouse_press_binding_dispatches_by_state() {
        let mut world = test_world();
        world.on_startup().unwrap();
        let state = MouseState::new(MouseButton::Left, vec![]);
        world.register_binding(Binding {
            name: "click".into(),
            modifiers: vec![],
            detail: BindingDetail::Mouse(state.clone()),
            mode: None,
            target: BindingTarget::None,
            pass_through: BindingPassThrough::Never,
            flags: BindingFlags::empty(),
            children: vec![],
            func: Box::new(|w, _| {
                w.quit();
                Ok(true)
            }),
        });

        world
            .handle_event(XEvent::MouseEvent {
                master: DEFAULT_MASTER,
                event: MouseEvent {
                    id: Xid::from(0),
                    rpt: Point::new(1, 1),
                    wpt: Point::new(1, 1),
                    state,
                    kind: MouseEventKind::Press,
                },
                synthetic: false,
            })
            .unwrap();
        assert!(world.is_shutting_down());
    }

    #[test]
    fn net_number_of_desktops_client_message_resizes_the_registry() {
        let mut world = test_world();
        world.on_startup().unwrap();
        assert_eq!(world.registry().workspaces().len(), 9);

        world
            .handle_event(XEvent::ClientMessage {
                id: world.root,
                dtype: "_NET_NUMBER_OF_DESKTOPS".into(),
                data: vec![3],
            })
            .unwrap();

        assert_eq!(world.registry().workspaces().len(), 3);
    }

    #[test]
    fn net_showing_desktop_client_message_toggles_the_flag() {
        let mut world = test_world();
        world.on_startup().unwrap();
        assert!(!world.showing_desktop);

        world
            .handle_event(XEvent::ClientMessage {
                id: world.root,
                dtype: "_NET_SHOWING_DESKTOP".into(),
                data: vec![1],
            })
            .unwrap();
        assert!(world.showing_desktop);

        world
            .handle_event(XEvent::ClientMessage {
                id: world.root,
                dtype: "_NET_SHOWING_DESKTOP".into(),
                data: vec![0],
            })
            .unwrap();
        assert!(!world.showing_desktop);
    }

    #[test]
    fn net_wm_state_client_message_updates_the_window_mask() {
        let mut world = test_world();
        world.on_startup().unwrap();
        world.handle_event(XEvent::MapRequest { id: Xid::from(1), ignore: false }).unwrap();

        world
            .handle_event(XEvent::ClientMessage {
                id: Xid::from(1),
                dtype: "_NET_WM_STATE".into(),
                data: vec![1, 0, 0],
            })
            .unwrap();

        assert!(world.registry().window(Xid::from(1)).unwrap().mask().contains(WindowMask::FULLSCREEN));
    }
}
