//! The crate-wide error type and a couple of small conveniences around it.
use crate::core::bindings::ModifierKey;

/// Every way that running the window manager can fail.
///
/// Rule callables and binding handlers return `Result<bool>` (the `bool` is the
/// "handled" value combined via pass-through, see [crate::core::engine]); nothing in
/// this crate unwinds via panics or exceptions for expected failure modes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An X reply indicated a transport level failure (BadWindow, BadValue, ...).
    ///
    /// Surfaced to the kind-0 rule. If `Config::crash_on_errors` is set the engine
    /// aborts after logging; otherwise this is logged and dispatch continues.
    #[error("X request failed (opcode {opcode}, sequence {sequence}): {detail}")]
    Transport {
        /// The request opcode that failed.
        opcode: u8,
        /// The request sequence number the error was reported against.
        sequence: u16,
        /// A short human readable description of the failure.
        detail: String,
    },

    /// A window disappeared between being detected and its properties being read.
    #[error("window {0} was unregistered mid-registration")]
    RegistrationRace(u32),

    /// Another window manager already owns the `WM_Sn` selection for this screen.
    #[error("WM_Sn selection for screen {0} is already owned by another window manager")]
    SelectionContention(usize),

    /// The periodic registry validator found a dangling or inconsistent cross-reference.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// A configure or map request was rejected by the X server while tiling.
    #[error("layout failed for window {0}: {1}")]
    LayoutFailure(u32, String),

    /// Attempted to look up an entity id that is not present in the registry.
    #[error("unknown {kind} id: {id}")]
    UnknownId {
        /// The entity kind being looked up (`"window"`, `"master"`, ...).
        kind: &'static str,
        /// The numeric id that was not found.
        id: u32,
    },

    /// Attempted to insert an entity id that is already present in the registry.
    #[error("{kind} id {id} is already registered")]
    DuplicateId {
        /// The entity kind being inserted.
        kind: &'static str,
        /// The numeric id that collided.
        id: u32,
    },

    /// A binding string used an unrecognised modifier key.
    #[error("unknown modifier key: {0}")]
    UnknownModifier(String),

    /// A binding config named a key that does not match any known X keysym.
    #[error("unknown keysym name: {0}")]
    UnknownKeysym(String),

    /// A binding's modifier list could not be resolved against a [ModifierKey].
    #[error("invalid binding modifiers: {0:?}")]
    InvalidModifiers(Vec<ModifierKey>),

    /// Failed to spawn an external process.
    #[error("unable to spawn external process: {0}")]
    SpawnProc(String),

    /// Generic escape hatch for user code / tests that need a simple error.
    #[error("{0}")]
    Raw(String),

    /// A lower level I/O failure (spawning processes, reading the persisted state file, ...).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A user supplied callback for handling errors that `World` cannot otherwise propagate
/// (e.g. an error returned from `X::next_event`, or from a detached rule re-entry).
pub type ErrorHandler = Box<dyn FnMut(Error)>;

/// An [ErrorHandler] that simply logs the error via `tracing::error!`.
pub fn logging_error_handler() -> ErrorHandler {
    Box::new(|e: Error| tracing::error!(%e, "unhandled error"))
}
