//! Hooks for injecting custom behaviour around the standard lifecycle points of
//! [crate::core::world::World], beyond what a binding or rule can express.
//!
//! A single [Hook] may implement as many of these trigger points as it needs; unused
//! methods default to a no-op. Hooks registered on a `World` are always run in
//! registration order.
use crate::core::data_types::Rect;
use crate::core::ids::{MasterId, Xid};
use crate::core::world::World;
use crate::core::xconnection::XConn;
use crate::error::Result;

/// A boxed, type-erased [Hook].
pub type Hooks<X> = Vec<Box<dyn Hook<X>>>;

/// Trigger points a [Hook] can observe and act on.
///
/// All methods take `&mut World<X>` and may freely mutate the registry, bindings or
/// rule tables; the engine lock is already held while a hook runs.
pub trait Hook<X: XConn> {
    /// Called once, after the connection is established and the registry has been
    /// seeded from [XConn::current_monitors]/[XConn::current_masters]/[XConn::current_slaves].
    fn startup(&mut self, _world: &mut World<X>) -> Result<()> {
        Ok(())
    }

    /// Called after a window has passed `PreRegisterWindow` rules and been inserted
    /// into the registry, before it is mapped.
    fn new_window(&mut self, _world: &mut World<X>, _id: Xid) -> Result<()> {
        Ok(())
    }

    /// Called just before a window is removed from the registry.
    fn remove_window(&mut self, _world: &mut World<X>, _id: Xid) -> Result<()> {
        Ok(())
    }

    /// Called whenever a window is added to a workspace's stack, whether newly mapped
    /// or moved from another workspace.
    fn window_added_to_workspace(&mut self, _world: &mut World<X>, _id: Xid, _wix: usize) -> Result<()> {
        Ok(())
    }

    /// Called after a tiling pass has applied a layout and issued configure requests
    /// for `wix`.
    fn layout_applied(&mut self, _world: &mut World<X>, _wix: usize) -> Result<()> {
        Ok(())
    }

    /// Called whenever a master's active workspace changes.
    fn workspace_change(&mut self, _world: &mut World<X>, _master: MasterId, _wix: usize) -> Result<()> {
        Ok(())
    }

    /// Called after RandR monitor geometry has been re-detected.
    fn monitors_updated(&mut self, _world: &mut World<X>, _monitors: &[Rect]) -> Result<()> {
        Ok(())
    }

    /// Called whenever a master's focused window changes.
    fn focus_change(&mut self, _world: &mut World<X>, _master: MasterId, _id: Xid) -> Result<()> {
        Ok(())
    }

    /// Called once per dispatched event, after its rules have all run.
    fn event_handled(&mut self, _world: &mut World<X>) -> Result<()> {
        Ok(())
    }
}
