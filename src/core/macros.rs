//! Utility macros for wiring bindings up to external commands and world methods.

/// Run an external command as a key or mouse binding, ignoring its output.
///
/// ```ignore
/// run_external!("dmenu_run")
/// ```
#[macro_export]
macro_rules! run_external {
    ($cmd:expr) => {
        Box::new(move |_: &mut $crate::core::world::World<_>, _: &$crate::core::bindings::BindingContext| {
            $crate::core::helpers::spawn($cmd)
        }) as Box<dyn FnMut(&mut $crate::core::world::World<_>, &$crate::core::bindings::BindingContext) -> $crate::error::Result<bool>>
    };
}

/// Call a method on [World](crate::core::world::World) as a key or mouse binding.
///
/// ```ignore
/// run_internal!(cycle_focus, Direction::Forward)
/// ```
#[macro_export]
macro_rules! run_internal {
    ($func:ident) => {
        Box::new(|world: &mut $crate::core::world::World<_>, ctx: &$crate::core::bindings::BindingContext| {
            world.$func(ctx)
        }) as Box<dyn FnMut(&mut $crate::core::world::World<_>, &$crate::core::bindings::BindingContext) -> $crate::error::Result<bool>>
    };

    ($func:ident, $($arg:expr),+) => {
        Box::new(move |world: &mut $crate::core::world::World<_>, ctx: &$crate::core::bindings::BindingContext| {
            world.$func(ctx, $($arg),+)
        }) as Box<dyn FnMut(&mut $crate::core::world::World<_>, &$crate::core::bindings::BindingContext) -> $crate::error::Result<bool>>
    };
}

/// Spawn an external process, discarding its output.
#[macro_export]
macro_rules! spawn {
    { $cmd:expr } => {
        $crate::core::helpers::spawn($cmd)
    };

    { $cmd:expr, $($arg:expr),+ } => {
        $crate::core::helpers::spawn_with_args($cmd, &[$($arg),+])
    };
}

/// Spawn an external process and split its captured stdout into lines.
#[macro_export]
macro_rules! spawn_for_output {
    { $cmd:expr } => {
        $crate::core::helpers::spawn_for_output($cmd).map(|s|
            s.trim().split('\n').map(String::from).collect::<Vec<String>>()
        )
    };

    { $cmd:expr, $($arg:expr),+ } => {
        $crate::core::helpers::spawn_for_output_with_args($cmd, &[$($arg),+]).map(|s|
            s.trim().split('\n').map(String::from).collect::<Vec<String>>()
        )
    };
}
