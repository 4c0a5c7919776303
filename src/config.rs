// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Installer profile layout.
//!
//! Specify the layout for the profile that dotstrap uses to simplify the
//! process of serialization and deserialization. File I/O is left to the
//! caller to figure out.
//!
//! # Why A Profile At All
//!
//! The shell installer this tool replaces read nothing: every path, mode,
//! and policy was baked into the script and queried ambiently at run time.
//! The profile turns each of those ambient facts into an explicit, injected
//! value -- where the playbook lives, where the inventory goes, which marker
//! file identifies the distribution, what permission mode the inventory
//! gets, and what should happen when provisioning fails. Built-in defaults
//! reproduce the original script, so a profile file is only needed to
//! diverge from it.

use crate::{
    inventory::{HostEntry, InventoryAccess},
    path,
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Package name of the automation tool installed during provisioning.
pub const AUTOMATION_PACKAGE: &str = "ansible";

/// Install profile layout.
///
/// A profile is composed of two basic parts: settings and packages. The
/// settings section defines the injected host facts and policies. The
/// packages section lists the packages to install during provisioning; when
/// absent, only the automation tool itself is installed.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct InstallProfile {
    /// Settings for the installer.
    pub settings: ProfileSettings,

    /// Packages to install during provisioning.
    #[serde(rename = "package")]
    pub packages: Option<Vec<PackageRequest>>,
}

impl InstallProfile {
    /// Profile reproducing the fixed paths of the original installer script.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if the home directory needed for
    ///   the default playbook path cannot be determined.
    pub fn try_default() -> Result<Self> {
        Ok(Self {
            settings: ProfileSettings {
                playbook: path::default_playbook_path()?,
                inventory: path::default_inventory_path(),
                distro_marker: path::default_distro_marker(),
                access: InventoryAccess::default(),
                on_provision_failure: FailurePolicy::default(),
                host_entry: HostEntry::default(),
            },
            packages: None,
        })
    }

    /// Effective package list for provisioning.
    pub fn package_names(&self) -> Vec<String> {
        match &self.packages {
            Some(packages) => packages.iter().map(|package| package.name.clone()).collect(),
            None => vec![AUTOMATION_PACKAGE.to_string()],
        }
    }
}

impl FromStr for InstallProfile {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut profile: InstallProfile =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on all path fields.
        profile.settings.playbook = expand_path(&profile.settings.playbook)?;
        profile.settings.inventory = expand_path(&profile.settings.inventory)?;
        profile.settings.distro_marker = expand_path(&profile.settings.distro_marker)?;

        Ok(profile)
    }
}

impl Display for InstallProfile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand_path(path: &PathBuf) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Installer configuration settings.
///
/// Standard settings injected into the bootstrap flow.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProfileSettings {
    /// Playbook handed to the playbook runner.
    pub playbook: PathBuf,

    /// Inventory file to provision.
    #[serde(default = "path::default_inventory_path")]
    pub inventory: PathBuf,

    /// Marker file whose presence identifies the recognized distribution.
    #[serde(default = "path::default_distro_marker")]
    pub distro_marker: PathBuf,

    /// Permission mode choice for the inventory file.
    #[serde(default)]
    pub access: InventoryAccess,

    /// What to do when a provisioning step fails.
    #[serde(default)]
    pub on_provision_failure: FailurePolicy,

    /// Host declaration ensured present in the inventory.
    #[serde(default)]
    pub host_entry: HostEntry,
}

/// Package requested for installation during provisioning.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PackageRequest {
    /// Name of the package as the package manager knows it.
    pub name: String,
}

/// Policy applied when a provisioning step fails.
///
/// The shell installer left this to the interpreter's continue-on-error
/// default, which made failure propagation implementation-defined. Here the
/// caller decides explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop before the playbook hand-off.
    #[default]
    Abort,

    /// Log the failure and continue to the playbook anyway.
    Continue,
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to determine home directory for default paths.
    #[error(transparent)]
    NoWayHome(#[from] path::NoWayHome),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("DOTS", "/home/blah/dotfiles")])]
    fn deserialize_install_profile() -> anyhow::Result<()> {
        let result: InstallProfile = r#"
            [settings]
            playbook = "$DOTS/setup.yml"
            inventory = "/etc/ansible/hosts"
            distro_marker = "/etc/arch-release"
            access = "world-writable"
            on_provision_failure = "continue"

            [settings.host_entry]
            name = "localhost"
            connection = "local"

            [[package]]
            name = "ansible"

            [[package]]
            name = "ansible-lint"
        "#
        .parse()?;

        let expect = InstallProfile {
            settings: ProfileSettings {
                playbook: "/home/blah/dotfiles/setup.yml".into(),
                inventory: "/etc/ansible/hosts".into(),
                distro_marker: "/etc/arch-release".into(),
                access: InventoryAccess::WorldWritable,
                on_provision_failure: FailurePolicy::Continue,
                host_entry: HostEntry::default(),
            },
            packages: Some(vec![
                PackageRequest {
                    name: "ansible".into(),
                },
                PackageRequest {
                    name: "ansible-lint".into(),
                },
            ]),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_fills_defaults() -> anyhow::Result<()> {
        let result: InstallProfile = r#"
            [settings]
            playbook = "/srv/dotfiles/setup.yml"
        "#
        .parse()?;

        assert_eq!(result.settings.inventory, PathBuf::from("/etc/ansible/hosts"));
        assert_eq!(
            result.settings.distro_marker,
            PathBuf::from("/etc/arch-release")
        );
        assert_eq!(result.settings.access, InventoryAccess::OwnerOnly);
        assert_eq!(result.settings.on_provision_failure, FailurePolicy::Abort);
        assert_eq!(result.settings.host_entry, HostEntry::default());
        assert_eq!(result.package_names(), vec!["ansible".to_string()]);

        Ok(())
    }

    #[test]
    fn serialize_install_profile() {
        let result = InstallProfile {
            settings: ProfileSettings {
                playbook: "/home/blah/dotfiles/setup.yml".into(),
                inventory: "/etc/ansible/hosts".into(),
                distro_marker: "/etc/arch-release".into(),
                access: InventoryAccess::OwnerOnly,
                on_provision_failure: FailurePolicy::Abort,
                host_entry: HostEntry::default(),
            },
            packages: Some(vec![PackageRequest {
                name: "ansible".into(),
            }]),
        }
        .to_string();

        let expect = indoc! {r#"
            [settings]
            playbook = "/home/blah/dotfiles/setup.yml"
            inventory = "/etc/ansible/hosts"
            distro_marker = "/etc/arch-release"
            access = "owner-only"
            on_provision_failure = "abort"

            [settings.host_entry]
            name = "localhost"
            connection = "local"

            [[package]]
            name = "ansible"
        "#};

        assert_eq!(result, expect);
    }
}
