//! Stable numeric ids for the entity kinds tracked by the [crate::core::registry::Registry].
//!
//! All cross-entity references are by id: the registry lookup is the sole authority on
//! whether a given id currently denotes a live entity (see `core/registry.rs`).
use std::fmt;
use std::ops::Deref;

macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        pub struct $name(pub(crate) u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $name {
            type Target = u32;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(Xid, "An X11 window id (also used for dock/strut owning windows).");
id_newtype!(MasterId, "The id of an MPX master (keyboard/pointer pair).");
id_newtype!(SlaveId, "The id of a physical or virtual input device (a slave).");
id_newtype!(MonitorId, "The id of a physical output / CRTC.");

/// The reserved id pair for the default core keyboard/pointer, present before any MPX
/// hierarchy change has been processed.
pub const DEFAULT_MASTER: MasterId = MasterId(1);
