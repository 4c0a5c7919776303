// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package manager operations.
//!
//! Provisioning delegates to pacman through sudo. Both operations run
//! interactively: pacman owns the terminal for its own confirmation and
//! sudo for its credential prompt, so nothing here captures output or
//! second-guesses either tool.

use crate::syscall::{self, Execute};

use tracing::info;

/// Synchronize package databases and upgrade the full system.
///
/// Equivalent to `sudo pacman -Syu`.
///
/// # Errors
///
/// - Return [`syscall::Error`] if the package manager cannot be invoked or
///   reports failure.
pub fn sync_upgrade(executor: &impl Execute) -> syscall::Result<()> {
    info!("synchronizing package databases and upgrading system");
    executor.run_interactive("sudo", ["pacman", "-Syu"])
}

/// Install a package by name.
///
/// Equivalent to `sudo pacman -S <package>`.
///
/// # Errors
///
/// - Return [`syscall::Error`] if the package manager cannot be invoked or
///   reports failure.
pub fn install(executor: &impl Execute, package: &str) -> syscall::Result<()> {
    info!("installing package {package}");
    executor.run_interactive("sudo", ["pacman", "-S", package])
}
