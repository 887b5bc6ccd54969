//! mpxwm: a tiling window manager core built around the X11 MPX (Multi-Pointer X)
//! extension, where every input master gets its own independent focus and window
//! stack instead of sharing one global "the" focused window.
//!
//! This crate is the control plane: the event-rule engine, the entity registry, the
//! binding/chain state machine, and the tiling driver all operate purely in terms of
//! the [`core::xconnection::XConn`] trait, so the whole thing is testable without a
//! real X server. A concrete backend plugs in by implementing that trait.
#![warn(
    clippy::complexity,
    clippy::correctness,
    clippy::style,
    future_incompatible,
    rust_2018_idioms
)]

pub mod core;
pub mod error;
pub mod persist;

pub use crate::core::world::World;
pub use crate::error::{Error, Result};
