// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way. None of these functions check
//! that the path they return actually exists; the installer decides what
//! absence means at each call site.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the bootstrap playbook.
///
/// The playbook is an external collaborator: dotstrap never writes it, only
/// hands it to the playbook runner. Defaults to `$HOME/.dotfiles/setup.yml`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_playbook_path() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".dotfiles").join("setup.yml"))
}

/// Default absolute path to the automation tool's inventory file.
pub fn default_inventory_path() -> PathBuf {
    PathBuf::from("/etc/ansible/hosts")
}

/// Default marker file whose presence identifies Arch Linux.
pub fn default_distro_marker() -> PathBuf {
    PathBuf::from("/etc/arch-release")
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
