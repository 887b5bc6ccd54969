//! User-defined key/mouse bindings, including the chain/modal extensions needed to
//! drive the binding state machine in [crate::core::engine].
use crate::core::data_types::Point;
use crate::core::ids::Xid;
use std::convert::TryFrom;

use strum::EnumIter;

/// A stable handle identifying one registered [Binding] within
/// [crate::core::world::World]'s binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) u32);

/// A u16 X key-code modifier bitmask.
pub type KeyCodeMask = u16;

/// A u8 X key-code enum value.
pub type KeyCodeValue = u8;

/// A key press and held modifiers, as resolved to raw X values.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct KeyCode {
    /// The held modifier mask.
    pub mask: KeyCodeMask,
    /// The key code that was held.
    pub code: KeyCodeValue,
}

impl KeyCode {
    /// Create a new [KeyCode] from this one that removes the given mask.
    pub fn ignoring_modifier(&self, mask: KeyCodeMask) -> KeyCode {
        KeyCode {
            mask: self.mask & !mask,
            code: self.code,
        }
    }
}

/// Known mouse buttons for binding actions.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
}

impl From<MouseButton> for u8 {
    fn from(b: MouseButton) -> u8 {
        match b {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::ScrollUp => 4,
            MouseButton::ScrollDown => 5,
        }
    }
}

/// Known modifier keys for bindings.
#[derive(Debug, EnumIter, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

/// Resolve a human-typed key name (e.g. `"Return"`, `"BackSpace"`) to its X keysym,
/// for validating config-time key names before a concrete backend maps them to a
/// keycode via the keyboard mapping of the running server.
#[cfg(feature = "keysyms")]
pub fn parse_keysym_name(name: &str) -> crate::error::Result<mpxwm_keysyms::XKeySym> {
    use std::str::FromStr;
    mpxwm_keysyms::XKeySym::from_str(name).map_err(|_| crate::error::Error::UnknownKeysym(name.into()))
}

impl TryFrom<&str> for ModifierKey {
    type Error = crate::error::Error;

    fn try_from(s: &str) -> crate::error::Result<Self> {
        match s {
            "C" => Ok(Self::Ctrl),
            "A" => Ok(Self::Alt),
            "S" => Ok(Self::Shift),
            "M" => Ok(Self::Meta),
            _ => Err(crate::error::Error::UnknownModifier(s.into())),
        }
    }
}

/// A mouse state specification indicating the button and modifiers held.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MouseState {
    pub button: MouseButton,
    pub modifiers: Vec<ModifierKey>,
}

impl MouseState {
    pub fn new(button: MouseButton, mut modifiers: Vec<ModifierKey>) -> Self {
        modifiers.sort();
        Self { button, modifiers }
    }
}

/// The types of mouse events represented by a [MouseEvent].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Motion,
}

/// A mouse movement or button event, tagged with the master it was delivered to.
#[derive(Debug, Clone)]
pub struct MouseEvent {
    pub id: Xid,
    /// Absolute coordinate of the event.
    pub rpt: Point,
    /// Coordinate of the event relative to the top-left of the window itself.
    pub wpt: Point,
    pub state: MouseState,
    pub kind: MouseEventKind,
}

/// Whether a [Binding] lets the triggering event continue on to the rest of the
/// ordered rule list, per pass-through semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThrough {
    /// Never pass the event on; this binding always short-circuits the list.
    Never,
    /// Always pass the event on to later bindings after running.
    Always,
    /// Pass the event on only if the bound function returned `Ok(true)`.
    IfTrue,
    /// Pass the event on only if the bound function returned `Ok(false)`.
    IfFalse,
}

/// Which window a triggered [Binding] acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTarget {
    /// The window the triggering master currently has focused.
    Focused,
    /// The window directly under the pointer / named by the raw event.
    EventTarget,
    /// No implicit target; the bound function resolves its own.
    None,
}

bitflags::bitflags! {
    /// Per-binding behavioural flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BindingFlags: u8 {
        /// Do not take an X grab for this binding; it only fires while some ancestor
        /// chain scope already holds one.
        const NO_GRAB             = 1 << 0;
        /// Filter out autorepeat key-repeat events before this binding is considered.
        const FILTER_KEY_REPEAT   = 1 << 1;
        /// Stop evaluating the rest of the active chain once this binding fires,
        /// regardless of its `PassThrough` policy.
        const SHORT_CIRCUITS      = 1 << 2;
        /// Pop the active chain scope after this binding runs.
        const POPS_CHAIN          = 1 << 3;
    }
}

/// A single registered key or mouse binding, possibly the root of a modal chain.
///
/// `children`, when non-empty, are the bindings active only while this binding's
/// chain scope is open; they shadow the master's global bindings for the scope's
/// lifetime.
pub struct Binding<X> {
    pub name: String,
    pub modifiers: Vec<ModifierKey>,
    pub detail: BindingDetail,
    pub mode: Option<u32>,
    pub target: BindingTarget,
    pub pass_through: PassThrough,
    pub flags: BindingFlags,
    pub children: Vec<Binding<X>>,
    pub(crate) func: Box<dyn FnMut(&mut X, &BindingContext) -> crate::error::Result<bool>>,
}

impl<X> std::fmt::Debug for Binding<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .field("detail", &self.detail)
            .field("mode", &self.mode)
            .field("target", &self.target)
            .field("pass_through", &self.pass_through)
            .field("flags", &self.flags)
            .field("children", &self.children)
            .finish()
    }
}

/// What a [Binding] matches against: a key code or a mouse button state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingDetail {
    Key(KeyCode),
    Mouse(MouseState),
}

/// Context passed to a binding's bound function describing what triggered it.
#[derive(Debug, Clone, Copy)]
pub struct BindingContext {
    pub master: crate::core::ids::MasterId,
    pub target: Option<Xid>,
}
