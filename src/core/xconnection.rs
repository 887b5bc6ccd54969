//! An abstraction layer for talking to an underlying X server, including the
//! Multi-Pointer X (XInput2) extension surface needed to track masters and slaves.
//!
//! The concrete transport (an `x11rb`-backed connection in a full build) is an
//! external collaborator; this module only defines the trait seam it implements and
//! the event/atom vocabulary the rest of the core speaks.
use crate::core::bindings::{KeyCode, MouseEvent};
use crate::core::data_types::{Point, Rect};
use crate::core::ids::{MasterId, SlaveId, Xid};
use crate::error::Result;

use strum::{AsRefStr, EnumIter, EnumString};

/// A type-safe representation of the X atoms this crate cares about.
///
/// Atom names are shared across every X11 client library; implementors of [XConn]
/// should accept and resolve any variant they are passed.
#[derive(AsRefStr, EnumString, EnumIter, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Atom {
    #[strum(serialize = "ATOM")]
    Atom,
    #[strum(serialize = "WM_CLASS")]
    WmClass,
    #[strum(serialize = "WM_DELETE_WINDOW")]
    WmDeleteWindow,
    #[strum(serialize = "WM_HINTS")]
    WmHints,
    #[strum(serialize = "WM_NORMAL_HINTS")]
    WmNormalHints,
    #[strum(serialize = "WM_PROTOCOLS")]
    WmProtocols,
    #[strum(serialize = "WM_STATE")]
    WmState,
    #[strum(serialize = "WM_NAME")]
    WmName,
    #[strum(serialize = "WM_TRANSIENT_FOR")]
    WmTransientFor,
    #[strum(serialize = "WM_TAKE_FOCUS")]
    WmTakeFocus,
    #[strum(serialize = "WM_PING")]
    WmPing,
    #[strum(serialize = "_NET_ACTIVE_WINDOW")]
    NetActiveWindow,
    #[strum(serialize = "_NET_CLIENT_LIST")]
    NetClientList,
    #[strum(serialize = "_NET_CLIENT_LIST_STACKING")]
    NetClientListStacking,
    #[strum(serialize = "_NET_CURRENT_DESKTOP")]
    NetCurrentDesktop,
    #[strum(serialize = "_NET_DESKTOP_NAMES")]
    NetDesktopNames,
    #[strum(serialize = "_NET_NUMBER_OF_DESKTOPS")]
    NetNumberOfDesktops,
    #[strum(serialize = "_NET_SUPPORTED")]
    NetSupported,
    #[strum(serialize = "_NET_SUPPORTING_WM_CHECK")]
    NetSupportingWmCheck,
    #[strum(serialize = "_NET_WM_DESKTOP")]
    NetWmDesktop,
    #[strum(serialize = "_NET_WM_NAME")]
    NetWmName,
    #[strum(serialize = "_NET_WM_STATE")]
    NetWmState,
    #[strum(serialize = "_NET_WM_STATE_FULLSCREEN")]
    NetWmStateFullscreen,
    #[strum(serialize = "_NET_WM_STATE_DEMANDS_ATTENTION")]
    NetWmStateDemandsAttention,
    #[strum(serialize = "_NET_WM_STATE_STICKY")]
    NetWmStateSticky,
    #[strum(serialize = "_NET_WM_STATE_ABOVE")]
    NetWmStateAbove,
    #[strum(serialize = "_NET_WM_STATE_BELOW")]
    NetWmStateBelow,
    #[strum(serialize = "_NET_WM_STATE_MODAL")]
    NetWmStateModal,
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_VERT")]
    NetWmStateMaximizedVert,
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_HORZ")]
    NetWmStateMaximizedHorz,
    #[strum(serialize = "_NET_WM_STATE_HIDDEN")]
    NetWmStateHidden,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE")]
    NetWmWindowType,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DOCK")]
    NetWindowTypeDock,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DIALOG")]
    NetWindowTypeDialog,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_TOOLBAR")]
    NetWindowTypeToolbar,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_UTILITY")]
    NetWindowTypeUtility,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_NORMAL")]
    NetWindowTypeNormal,
    #[strum(serialize = "_NET_WM_STRUT")]
    NetWmStrut,
    #[strum(serialize = "_NET_WM_STRUT_PARTIAL")]
    NetWmStrutPartial,
    #[strum(serialize = "_NET_FRAME_EXTENTS")]
    NetFrameExtents,
    #[strum(serialize = "_NET_SHOWING_DESKTOP")]
    NetShowingDesktop,
}

/// Clients with one of these window types are auto-floated rather than tiled.
pub const AUTO_FLOAT_WINDOW_TYPES: &[Atom] = &[
    Atom::NetWindowTypeDialog,
    Atom::NetWindowTypeToolbar,
    Atom::NetWindowTypeUtility,
];

/// Windows with a type in this list are never managed as tileable clients at all.
pub const UNMANAGED_WINDOW_TYPES: &[Atom] = &[Atom::NetWindowTypeDock];

/// A single X/XInput2 event, normalized to the vocabulary the core dispatches on.
///
/// Synthetic (client-generated) events and XInput2 generic events are folded into this
/// same enum by the transport rather than handled as a separate code path, per the
/// §6.1's "events are normalized before dispatch" requirement.
#[derive(Debug, Clone)]
pub enum XEvent {
    KeyPress {
        master: MasterId,
        code: KeyCode,
        synthetic: bool,
    },
    MouseEvent {
        master: MasterId,
        event: MouseEvent,
        synthetic: bool,
    },
    MapRequest {
        id: Xid,
        ignore: bool,
    },
    Enter {
        master: MasterId,
        id: Xid,
        rpt: Point,
        wpt: Point,
    },
    Leave {
        master: MasterId,
        id: Xid,
        rpt: Point,
        wpt: Point,
    },
    Destroy {
        id: Xid,
    },
    ConfigureNotify {
        id: Xid,
        r: Rect,
        is_root: bool,
    },
    ConfigureRequest {
        id: Xid,
        r: Rect,
    },
    PropertyNotify {
        id: Xid,
        atom: String,
        is_root: bool,
    },
    ClientMessage {
        id: Xid,
        dtype: String,
        data: Vec<usize>,
    },
    ScreenChange,
    RandrNotify,
    /// A new master (keyboard/pointer pair) was added to the X server's input
    /// hierarchy.
    MasterAdded {
        id: MasterId,
        keyboard: SlaveId,
        pointer: SlaveId,
    },
    /// A master was removed from the X server's input hierarchy.
    MasterRemoved {
        id: MasterId,
    },
    /// A slave device was attached to, detached from, or reattached between masters.
    SlaveAttachmentChanged {
        id: SlaveId,
        master: Option<MasterId>,
    },
    /// A new slave device appeared (hotplug).
    SlaveAdded {
        id: SlaveId,
        master: Option<MasterId>,
    },
    /// A slave device disappeared.
    SlaveRemoved {
        id: SlaveId,
    },
}

/// The abstraction layer over the underlying X server connection.
///
/// Implementors are responsible for translating raw protocol replies into this crate's
/// types and for normalizing synthetic/generic events into [XEvent] before handing them
/// to [crate::core::pump]. No concrete transport is implemented here; that's left to
/// whichever crate wires a real X11 library up to this trait.
pub trait XConn {
    /// Block until the next event is available, or return `Ok(None)` if the connection
    /// was woken without a real event (used to implement the idle-poll loop in
    /// [crate::core::pump]).
    fn poll_for_event(&self) -> Result<Option<XEvent>>;

    /// The id of the root window for the default screen.
    fn root(&self) -> Xid;

    /// Every monitor currently reported by RandR.
    fn current_monitors(&self) -> Result<Vec<crate::core::monitor::Monitor>>;

    /// Every master currently present in the X input hierarchy.
    fn current_masters(&self) -> Result<Vec<crate::core::master::Master>>;

    /// Every slave device currently present in the X input hierarchy.
    fn current_slaves(&self) -> Result<Vec<crate::core::slave::Slave>>;

    /// Map `id` on the X server.
    fn map_window(&self, id: Xid) -> Result<()>;

    /// Unmap `id` on the X server.
    fn unmap_window(&self, id: Xid) -> Result<()>;

    /// Move/resize `id` to `r`, bypassing any client-side geometry lock.
    fn configure_window(&self, id: Xid, r: Rect, border: u32) -> Result<()>;

    /// Restack `id` directly above `sibling` (or to the top, if `sibling` is `None`).
    fn raise_window(&self, id: Xid, sibling: Option<Xid>) -> Result<()>;

    /// Set input focus to `id` for the given master's keyboard.
    fn focus_window(&self, master: MasterId, id: Xid) -> Result<()>;

    /// Resolve an atom name to its interned X atom id.
    fn intern_atom(&self, name: &str) -> Result<u32>;

    /// Read a property from `id` as a list of interned atom values.
    fn get_atom_prop(&self, id: Xid, prop: Atom) -> Result<Vec<u32>>;

    /// Read a string property from `id` (e.g. `WM_NAME`, `WM_CLASS`).
    fn get_str_prop(&self, id: Xid, prop: Atom) -> Result<String>;

    /// Overwrite a property on `id`.
    fn change_prop(&self, id: Xid, prop: Atom, value: &[u32]) -> Result<()>;

    /// Overwrite a text property on `id` (e.g. `WM_NAME`/`_NET_WM_NAME`).
    fn change_text_prop(&self, id: Xid, prop: Atom, value: &str) -> Result<()>;

    /// Send a `WM_PROTOCOLS` client message of kind `proto` to `id`.
    fn send_client_message(&self, id: Xid, proto: Atom) -> Result<()>;

    /// Grab `code` on `master`'s keyboard device, rooted at `id`.
    fn grab_key(&self, master: MasterId, id: Xid, code: KeyCode) -> Result<()>;

    /// Release a previous [XConn::grab_key].
    fn ungrab_key(&self, master: MasterId, id: Xid, code: KeyCode) -> Result<()>;

    /// Take an exclusive grab of every key/button on `master`'s devices (used to open
    /// a whole-device chain scope).
    fn grab_device(&self, master: MasterId) -> Result<()>;

    /// Release a previous [XConn::grab_device].
    fn ungrab_device(&self, master: MasterId) -> Result<()>;

    /// Attach `slave` to `master` (`XIChangeHierarchy`'s `AttachSlave`).
    fn attach_slave(&self, slave: SlaveId, master: MasterId) -> Result<()>;

    /// Detach `slave`, leaving it floating.
    fn detach_slave(&self, slave: SlaveId) -> Result<()>;

    /// Create a new master keyboard/pointer pair named `name`.
    fn create_master(&self, name: &str) -> Result<MasterId>;

    /// Remove `master` from the X input hierarchy.
    fn remove_master(&self, master: MasterId) -> Result<()>;

    /// Warp `master`'s pointer to an absolute position.
    fn warp_pointer(&self, master: MasterId, p: Point) -> Result<()>;

    /// The last-known absolute pointer position for `master`.
    fn pointer_position(&self, master: MasterId) -> Result<Point>;

    /// Attempt to take ownership of the `WM_Sn` selection for the default screen.
    fn acquire_wm_selection(&self) -> Result<()>;

    /// Flush any buffered requests to the server.
    fn flush(&self);
}
