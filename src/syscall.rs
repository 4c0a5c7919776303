// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process invocation.
//!
//! Every side effect the installer performs goes through an external binary:
//! `uname` for host facts, the package manager for provisioning, and the
//! playbook runner for the final hand-off. All of those calls funnel through
//! the [`Execute`] trait so the bootstrap flow itself never touches
//! [`std::process::Command`] directly, and tests can swap in a recording
//! fake instead of mutating the host.
//!
//! Two calling conventions exist. Interactive calls inherit the current
//! terminal, because tools like the package manager and the playbook runner
//! prompt the user themselves (confirmation, privilege elevation). Quiet
//! calls capture output for the caller to parse, e.g. the kernel name
//! reported by `uname -s`.

use std::{
    ffi::{OsStr, OsString},
    process::Command,
};
use tracing::debug;

/// Layer of indirection for external process invocation.
pub trait Execute {
    /// Run command to completion with inherited stdio.
    ///
    /// Blocks the current process, leaving the terminal to the child so it
    /// can run its own prompts.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Execute`] if the command cannot be spawned.
    /// - Return [`Error::CommandFailed`] if the command exits non-zero.
    fn run_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<()>;

    /// Run command to completion with captured output.
    ///
    /// Returns the command's stdout with trailing newlines chomped. Stderr is
    /// only surfaced through the error message on failure.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Execute`] if the command cannot be spawned.
    /// - Return [`Error::CommandFailed`] if the command exits non-zero.
    fn run_quiet(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<String>;
}

/// Process execution through [`std::process::Command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemExecutor;

impl Execute for SystemExecutor {
    fn run_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<()> {
        let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
        let rendered = render_command(cmd.as_ref(), &args);
        debug!("run interactive: {rendered}");

        let status = Command::new(cmd.as_ref())
            .args(&args)
            .spawn()
            .and_then(|mut child| child.wait())
            .map_err(|err| Error::Execute {
                source: err,
                command: rendered.clone(),
            })?;

        if !status.success() {
            return Err(Error::CommandFailed {
                command: rendered,
                details: status.to_string(),
            });
        }

        Ok(())
    }

    fn run_quiet(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<String> {
        let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
        let rendered = render_command(cmd.as_ref(), &args);
        debug!("run quiet: {rendered}");

        let output = Command::new(cmd.as_ref())
            .args(&args)
            .output()
            .map_err(|err| Error::Execute {
                source: err,
                command: rendered.clone(),
            })?;

        let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
        let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

        if !output.status.success() {
            let mut details = String::new();
            if !stdout.is_empty() {
                details.push_str(format!("stdout: {stdout}").as_str());
            }

            if !stderr.is_empty() {
                details.push_str(format!("stderr: {stderr}").as_str());
            }

            return Err(Error::CommandFailed {
                command: rendered,
                details: chomp(details),
            });
        }

        Ok(chomp(stdout))
    }
}

impl<E> Execute for &E
where
    E: Execute,
{
    fn run_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<()> {
        (**self).run_interactive(cmd, args)
    }

    fn run_quiet(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<String> {
        (**self).run_quiet(cmd, args)
    }
}

fn render_command(cmd: &OsStr, args: &[OsString]) -> String {
    let mut rendered = cmd.to_string_lossy().into_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg.to_string_lossy().as_ref());
    }

    rendered
}

// INVARIANT: Chomp trailing newlines.
fn chomp(message: String) -> String {
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// Process invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command cannot be spawned or awaited.
    #[error("failed to execute command {command:?}")]
    Execute {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Command ran to completion, but reported failure.
    #[error("command {command:?} failed: {details}")]
    CommandFailed { command: String, details: String },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chomp_strips_one_trailing_newline() {
        assert_eq!(chomp("Linux\n".into()), "Linux");
        assert_eq!(chomp("Linux\r\n".into()), "Linux");
        assert_eq!(chomp("Linux".into()), "Linux");
    }

    #[cfg(unix)]
    #[test]
    fn run_quiet_captures_stdout() {
        let result = SystemExecutor.run_quiet("echo", ["hello"]).unwrap();
        assert_eq!(result, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_quiet_reports_non_zero_exit() {
        let result = SystemExecutor.run_quiet("false", Vec::<String>::new());
        assert!(matches!(result, Err(Error::CommandFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn missing_binary_cannot_execute() {
        let result = SystemExecutor.run_quiet("definitely-not-a-binary", ["--version"]);
        assert!(matches!(result, Err(Error::Execute { .. })));
    }
}
