//! Small utilities for spawning external processes from bindings and hooks.
use std::io::Read;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Run an external command, redirecting its stdout and stderr to `/dev/null`.
pub fn spawn<S: Into<String>>(cmd: S) -> Result<()> {
    let s = cmd.into();
    let mut parts = s.split_whitespace();
    let Some(prog) = parts.next() else {
        return Ok(());
    };
    Command::new(prog)
        .args(parts)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// Run an external command with the given arguments, redirecting stdout/stderr to `/dev/null`.
pub fn spawn_with_args<S: Into<String>>(cmd: S, args: &[&str]) -> Result<()> {
    Command::new(cmd.into())
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// Run an external command and capture its stdout.
pub fn spawn_for_output<S: Into<String>>(cmd: S) -> Result<String> {
    let cmd = cmd.into();
    debug!(%cmd, "spawning subprocess for output");
    let mut parts = cmd.split_whitespace();
    let Some(prog) = parts.next() else {
        return Ok(String::new());
    };
    let mut child = Command::new(prog).args(parts).stdout(Stdio::piped()).spawn()?;

    let mut buff = String::new();
    child
        .stdout
        .take()
        .ok_or_else(|| Error::SpawnProc(cmd.clone()))?
        .read_to_string(&mut buff)?;
    Ok(buff)
}

/// Run an external command with arguments and capture its stdout.
pub fn spawn_for_output_with_args<S: Into<String>>(cmd: S, args: &[&str]) -> Result<String> {
    let cmd = cmd.into();
    debug!(%cmd, ?args, "spawning subprocess for output");
    let mut child = Command::new(&cmd).args(args).stdout(Stdio::piped()).spawn()?;

    let mut buff = String::new();
    child
        .stdout
        .take()
        .ok_or_else(|| Error::SpawnProc(cmd.clone()))?
        .read_to_string(&mut buff)?;
    Ok(buff)
}
