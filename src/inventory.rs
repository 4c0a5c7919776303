// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Inventory file management.
//!
//! The installer owns exactly one piece of persistent state: the inventory
//! file that tells the automation tool which hosts it manages and how to
//! connect to them. For a dotfiles bootstrap that is a single declaration,
//! `localhost ansible_connection=local`, sitting at a fixed well-known path.
//!
//! # Ensure Semantics
//!
//! Everything here is an "ensure", never a blind mutation. The parent
//! directory is created with mkdir -p semantics, the file is opened without
//! truncation so existing host declarations survive, and the declaration
//! line is appended only when no equivalent line already exists. Running the
//! installer twice therefore leaves the inventory byte-identical to running
//! it once.
//!
//! # Access Modes
//!
//! The inventory is later consumed by a tool running with elevated
//! privileges, so its permission mode is a named choice instead of a
//! hardcoded chmod. [`InventoryAccess::OwnerOnly`] keeps writes to the
//! owner. [`InventoryAccess::WorldWritable`] reproduces the historical
//! `chmod 777` of the shell installer this tool replaces, and hands every
//! local user write access to commands that will eventually run as root --
//! opt in only if the host has exactly one user and you know why you want
//! parity.

use mkdirp::mkdirp;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_to_string, write, OpenOptions},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Inventory file at a fixed path with a configured access mode.
#[derive(Clone, Debug)]
pub struct Inventory {
    hosts_path: PathBuf,
    access: InventoryAccess,
}

impl Inventory {
    /// Construct new inventory handle.
    pub fn new(hosts_path: impl Into<PathBuf>, access: InventoryAccess) -> Self {
        Self {
            hosts_path: hosts_path.into(),
            access,
        }
    }

    /// Ensure inventory file exists with the configured access mode.
    ///
    /// Creates the parent directory and the file itself if either is
    /// missing, then applies the access mode. Existing file content is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// - Return [`Error::CreateInventoryDir`] if the parent directory cannot
    ///   be created.
    /// - Return [`Error::CreateInventoryFile`] if the file cannot be created.
    /// - Return [`Error::SetAccessMode`] if the access mode cannot be
    ///   applied.
    pub fn ensure(&self) -> Result<()> {
        if let Some(parent) = self.hosts_path.parent() {
            mkdirp(parent).map_err(|err| Error::CreateInventoryDir {
                source: err,
                dir_path: parent.to_path_buf(),
            })?;
        }

        // INVARIANT: Create inventory file without truncating existing declarations.
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.hosts_path)
            .map_err(|err| Error::CreateInventoryFile {
                source: err,
                hosts_path: self.hosts_path.clone(),
            })?;

        apply_mode(&self.hosts_path, self.access.mode()).map_err(|err| Error::SetAccessMode {
            source: err,
            hosts_path: self.hosts_path.clone(),
        })?;
        info!(
            "ensured inventory at {:?} with mode {:o}",
            self.hosts_path.display(),
            self.access.mode()
        );

        Ok(())
    }

    /// Edit inventory declarations.
    ///
    /// Read current declarations into an [`InventoryEdit`] instance, and
    /// directly edit them before writing the results back to the inventory
    /// file. The file is rewritten only when the edit changed something.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadInventoryFile`] if the inventory cannot be read.
    /// - Return [`Error::WriteInventoryFile`] if the edited declarations
    ///   cannot be written back.
    pub fn edit<E>(&self, editor: E) -> Result<()>
    where
        E: FnOnce(&mut InventoryEdit),
    {
        let content =
            read_to_string(&self.hosts_path).map_err(|err| Error::ReadInventoryFile {
                source: err,
                hosts_path: self.hosts_path.clone(),
            })?;

        let mut declarations = InventoryEdit::from(content);
        editor(&mut declarations);

        if !declarations.changed() {
            return Ok(());
        }

        write(&self.hosts_path, declarations.to_string().as_bytes()).map_err(|err| {
            Error::WriteInventoryFile {
                source: err,
                hosts_path: self.hosts_path.clone(),
            }
        })?;

        Ok(())
    }

    /// List current inventory lines.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadInventoryFile`] if the inventory cannot be read.
    pub fn current_lines(&self) -> Result<Vec<String>> {
        read_to_string(&self.hosts_path)
            .map_err(|err| Error::ReadInventoryFile {
                source: err,
                hosts_path: self.hosts_path.clone(),
            })
            .map(|content| content.lines().map(str::to_owned).collect::<Vec<_>>())
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Inventory declaration editor.
///
/// # Invariant
///
/// - No duplicate host declarations.
/// - Lines this tool does not understand (comments, other hosts, groups)
///   are preserved verbatim in their original order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InventoryEdit {
    lines: Vec<String>,
    changed: bool,
}

impl InventoryEdit {
    /// Construct new inventory declaration editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a host declaration is present.
    ///
    /// Appends the declaration only when no existing line already declares
    /// the same host with the same connection.
    pub fn ensure_entry(&mut self, entry: &HostEntry) {
        if self.lines.iter().any(|line| entry.matches_line(line)) {
            debug!("declaration {entry} already present");
            return;
        }

        self.lines.push(entry.to_string());
        self.changed = true;
    }

    /// Check if a host declaration is present.
    pub fn contains_entry(&self, entry: &HostEntry) -> bool {
        self.lines.iter().any(|line| entry.matches_line(line))
    }

    /// Whether any edit actually changed the declarations.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

impl Display for InventoryEdit {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        if self.lines.is_empty() {
            return write!(fmt, "");
        }

        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }

        write!(fmt, "{out}")
    }
}

impl From<String> for InventoryEdit {
    fn from(content: String) -> Self {
        InventoryEdit::from(content.as_str())
    }
}

impl From<&str> for InventoryEdit {
    fn from(content: &str) -> Self {
        let lines = content.lines().map(str::to_owned).collect::<Vec<_>>();

        Self {
            lines,
            changed: false,
        }
    }
}

/// A single host declaration line.
///
/// Renders as `<name> ansible_connection=<connection>`, the form the
/// automation tool expects for hosts it should reach without SSH.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostEntry {
    /// Host name the declaration addresses.
    pub name: String,

    /// Connection plugin the automation tool should use.
    pub connection: String,
}

impl HostEntry {
    /// Construct new host declaration.
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection: connection.into(),
        }
    }

    /// Check whether an inventory line declares this host and connection.
    ///
    /// Matching is token based, so extra variables on the line do not defeat
    /// recognition.
    pub fn matches_line(&self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        let connection = format!("ansible_connection={}", self.connection);

        tokens.next() == Some(self.name.as_str()) && tokens.any(|token| token == connection)
    }
}

impl Default for HostEntry {
    fn default() -> Self {
        Self::new("localhost", "local")
    }
}

impl Display for HostEntry {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        write!(fmt, "{} ansible_connection={}", self.name, self.connection)
    }
}

/// Named permission choice for the inventory file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryAccess {
    /// Readable by everyone, writable by the owner only (mode 644).
    #[default]
    OwnerOnly,

    /// Readable, writable, and executable by every user (mode 777). This is
    /// what the shell installer this tool replaces did; any local user can
    /// then rewrite an inventory that is later executed with elevated
    /// privileges.
    WorldWritable,
}

impl InventoryAccess {
    /// Unix permission bits for this access choice.
    pub const fn mode(self) -> u32 {
        match self {
            Self::OwnerOnly => 0o644,
            Self::WorldWritable => 0o777,
        }
    }
}

/// Inventory management error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Inventory parent directory cannot be created when missing.
    #[error("failed to create inventory directory at {:?}", dir_path.display())]
    CreateInventoryDir {
        #[source]
        source: std::io::Error,
        dir_path: PathBuf,
    },

    /// Inventory file cannot be created when missing.
    #[error("failed to create inventory file at {:?}", hosts_path.display())]
    CreateInventoryFile {
        #[source]
        source: std::io::Error,
        hosts_path: PathBuf,
    },

    /// Inventory file cannot be read from.
    #[error("failed to read from inventory file at {:?}", hosts_path.display())]
    ReadInventoryFile {
        #[source]
        source: std::io::Error,
        hosts_path: PathBuf,
    },

    /// Inventory file cannot be written to.
    #[error("failed to write to inventory file at {:?}", hosts_path.display())]
    WriteInventoryFile {
        #[source]
        source: std::io::Error,
        hosts_path: PathBuf,
    },

    /// Access mode cannot be applied to inventory file.
    #[error("failed to set access mode on inventory file at {:?}", hosts_path.display())]
    SetAccessMode {
        #[source]
        source: std::io::Error,
        hosts_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[test]
    fn ensure_entry_appends_once() {
        let mut editor = InventoryEdit::new();
        let entry = HostEntry::default();

        editor.ensure_entry(&entry);
        editor.ensure_entry(&entry);
        let result = editor.to_string();
        let expect = indoc! {r#"
            localhost ansible_connection=local
        "#};
        assert_eq!(result, expect);
        assert!(editor.changed());
    }

    #[test]
    fn ensure_entry_preserves_unrelated_lines() {
        let existing = indoc! {r#"
            # staging boxes
            web01.example.com ansible_user=deploy
        "#};
        let mut editor = InventoryEdit::from(existing);

        editor.ensure_entry(&HostEntry::default());
        let result = editor.to_string();
        let expect = indoc! {r#"
            # staging boxes
            web01.example.com ansible_user=deploy
            localhost ansible_connection=local
        "#};
        assert_eq!(result, expect);
    }

    #[test]
    fn ensure_entry_recognizes_existing_declaration() {
        let existing = "localhost ansible_connection=local ansible_user=root\n";
        let mut editor = InventoryEdit::from(existing);

        editor.ensure_entry(&HostEntry::default());
        assert!(!editor.changed());
        assert!(editor.contains_entry(&HostEntry::default()));
    }

    #[test_case("localhost ansible_connection=local", true; "exact declaration")]
    #[test_case("localhost   ansible_connection=local", true; "extra whitespace")]
    #[test_case("localhost ansible_user=root ansible_connection=local", true; "extra variables")]
    #[test_case("# localhost ansible_connection=local", false; "commented out")]
    #[test_case("localhost ansible_connection=ssh", false; "different connection")]
    #[test_case("otherhost ansible_connection=local", false; "different host")]
    #[test]
    fn host_entry_line_matching(line: &str, expect: bool) {
        pretty_assertions::assert_eq!(HostEntry::default().matches_line(line), expect);
    }

    #[test]
    fn host_entry_renders_declaration() {
        let result = HostEntry::new("localhost", "local").to_string();
        assert_eq!(result, "localhost ansible_connection=local");
    }

    #[sealed_test]
    fn ensure_creates_directory_and_file() -> anyhow::Result<()> {
        let inventory = Inventory::new("ansible/hosts", InventoryAccess::OwnerOnly);

        inventory.ensure()?;
        assert!(Path::new("ansible/hosts").exists());
        assert_eq!(inventory.current_lines()?, Vec::<String>::new());

        Ok(())
    }

    #[cfg(unix)]
    #[sealed_test]
    fn ensure_applies_configured_mode() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let inventory = Inventory::new("ansible/hosts", InventoryAccess::WorldWritable);
        inventory.ensure()?;

        let mode = std::fs::metadata("ansible/hosts")?.permissions().mode();
        assert_eq!(mode & 0o777, 0o777);

        Ok(())
    }

    #[cfg(unix)]
    #[sealed_test]
    fn ensure_keeps_existing_declarations() -> anyhow::Result<()> {
        std::fs::create_dir("ansible")?;
        std::fs::write("ansible/hosts", "web01.example.com\n")?;

        let inventory = Inventory::new("ansible/hosts", InventoryAccess::OwnerOnly);
        inventory.ensure()?;
        assert_eq!(inventory.current_lines()?, vec!["web01.example.com".to_string()]);

        Ok(())
    }

    #[sealed_test]
    fn edit_rewrites_only_when_changed() -> anyhow::Result<()> {
        let inventory = Inventory::new("ansible/hosts", InventoryAccess::OwnerOnly);
        inventory.ensure()?;

        inventory.edit(|edit| edit.ensure_entry(&HostEntry::default()))?;
        inventory.edit(|edit| edit.ensure_entry(&HostEntry::default()))?;
        assert_eq!(
            inventory.current_lines()?,
            vec!["localhost ansible_connection=local".to_string()]
        );

        Ok(())
    }
}
