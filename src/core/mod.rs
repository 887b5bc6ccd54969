//! Core data structures and the event-driven engine that drives the window manager.
pub mod bindings;
pub mod config;
pub mod data_types;
pub mod dock;
pub mod engine;
pub mod focus;
pub mod helpers;
pub mod hooks;
pub mod ids;
pub mod layout;
#[macro_use]
pub mod macros;
pub mod master;
pub mod monitor;
pub mod protocol;
pub mod pump;
pub mod registry;
pub mod ring;
pub mod slave;
pub mod tiling;
pub mod window;
pub mod workspace;
pub mod world;
pub mod xconnection;
