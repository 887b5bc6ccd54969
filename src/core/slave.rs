//! Slave input devices: the physical/virtual keyboards and pointers attached to masters.
use crate::core::ids::{MasterId, SlaveId};

/// The kind of physical device a [Slave] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveKind {
    Keyboard,
    Pointer,
}

/// A slave input device: a physical or virtual keyboard/pointer attached to some
/// [crate::core::master::Master], or floating if unattached.
///
/// Floating slaves generate no input events that the core dispatches to any master
/// until reattached.
#[derive(Debug, Clone)]
pub struct Slave {
    id: SlaveId,
    kind: SlaveKind,
    name: String,
    attached_master: Option<MasterId>,
    /// `true` for the XTEST virtual devices the X server creates for synthetic input.
    is_test_device: bool,
}

impl Slave {
    /// Construct a new, unattached [Slave].
    pub fn new(id: SlaveId, kind: SlaveKind, name: impl Into<String>, is_test_device: bool) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            attached_master: None,
            is_test_device,
        }
    }

    /// This slave's id.
    pub fn id(&self) -> SlaveId {
        self.id
    }

    /// Whether this is a keyboard or pointer device.
    pub fn kind(&self) -> SlaveKind {
        self.kind
    }

    /// This slave's device name, as reported by XInput.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The master this slave is currently attached to, if any.
    pub fn attached_master(&self) -> Option<MasterId> {
        self.attached_master
    }

    /// Attach this slave to `master`.
    pub fn attach(&mut self, master: MasterId) {
        self.attached_master = Some(master);
    }

    /// Detach this slave, leaving it floating.
    pub fn detach(&mut self) {
        self.attached_master = None;
    }

    /// `true` if this slave is currently unattached to any master.
    pub fn is_floating(&self) -> bool {
        self.attached_master.is_none()
    }

    /// `true` if this is an XTEST virtual device.
    pub fn is_test_device(&self) -> bool {
        self.is_test_device
    }
}
