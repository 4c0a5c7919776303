// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap a dotfiles-managed host.
//!
//! Dotstrap replaces the little installer script that every dotfiles
//! repository grows eventually: detect the operating system, provision the
//! automation tool and its inventory on the one recognized distribution,
//! then hand the host over to a playbook that does the real work.
//!
//! The crate is split along the seams the old script blurred together.
//! Host facts, filesystem locations, and failure policies are injected
//! through [`config::InstallProfile`] instead of queried ambiently, and all
//! process invocation goes through [`syscall::Execute`] so the whole flow
//! can run against a fake executor in tests. The [`forecast`] module is the
//! odd one out: it serves the repository's waybar setup rather than the
//! bootstrap itself.

pub mod config;
pub mod forecast;
pub mod host;
pub mod install;
pub mod inventory;
pub mod package;
pub mod path;
pub mod playbook;
pub mod syscall;
