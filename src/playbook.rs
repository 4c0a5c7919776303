// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Playbook hand-off.
//!
//! The playbook is the real payload of the bootstrap: a declarative
//! description of the desired end-state of the host, consumed by an
//! external runner. This module only locates the runner and hands over the
//! terminal; everything the playbook does afterwards is the runner's
//! business, including its own privilege-elevation prompt.

use crate::syscall::{self, Execute};

use std::{ffi::OsString, path::Path};
use tracing::info;

/// Binary name of the external playbook runner.
pub const RUNNER_BIN: &str = "ansible-playbook";

/// Check whether the playbook runner is reachable on PATH.
///
/// Used as a preflight so a missing runner can be called out before the
/// hand-off, instead of surfacing only as the runner's own spawn failure.
pub fn runner_available(executor: &impl Execute) -> bool {
    executor.run_quiet("which", [RUNNER_BIN]).is_ok()
}

/// Invoke the playbook runner against the target playbook.
///
/// Runs interactively with `--ask-become-pass` so the runner can prompt for
/// privilege elevation, and blocks until the playbook finishes.
///
/// # Errors
///
/// - Return [`syscall::Error`] if the runner cannot be invoked or reports
///   failure.
pub fn run(executor: &impl Execute, playbook: impl AsRef<Path>) -> syscall::Result<()> {
    info!("handing off to {} for {:?}", RUNNER_BIN, playbook.as_ref().display());
    executor.run_interactive(
        RUNNER_BIN,
        [
            playbook.as_ref().as_os_str().to_os_string(),
            OsString::from("--ask-become-pass"),
        ],
    )
}
