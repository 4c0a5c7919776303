// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap orchestration.
//!
//! The flow is strictly linear: probe the host, provision the automation
//! stack when the host runs the recognized distribution, then hand off to
//! the playbook runner. Every step reports an explicit result. Nothing here
//! relies on an ambient continue-on-error mode -- the one deliberately soft
//! spot is the provisioning block, whose failure handling is the profile's
//! [`FailurePolicy`] to decide.
//!
//! # Branching
//!
//! An unsupported kernel stops everything before any side effect. A Linux
//! host without the distribution marker skips provisioning but still gets
//! the playbook, which matches the original installer: on such hosts the
//! automation tool is assumed to be the user's problem, and the runner's
//! own diagnostics report its absence.

use crate::{
    config::{FailurePolicy, InstallProfile},
    host::{self, Distro, HostFacts},
    inventory::{self, Inventory},
    package, playbook,
    syscall::{self, Execute},
};

use tracing::{debug, info, instrument, warn};

/// Bootstrap installer over an injected process executor.
#[derive(Clone, Debug)]
pub struct Installer<E>
where
    E: Execute,
{
    profile: InstallProfile,
    executor: E,
}

impl<E> Installer<E>
where
    E: Execute,
{
    /// Construct new installer.
    pub fn new(profile: InstallProfile, executor: E) -> Self {
        Self { profile, executor }
    }

    /// Run the full bootstrap flow.
    ///
    /// Probes the host, provisions on the recognized distribution unless
    /// `skip_provision` is set, then invokes the playbook runner and waits
    /// for it.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Host`] if the kernel is unsupported or cannot be
    ///   probed. No provisioning or playbook invocation happens in that
    ///   case.
    /// - Return [`Error::Provision`] if provisioning fails under the
    ///   [`FailurePolicy::Abort`] policy.
    /// - Return [`Error::Playbook`] if the playbook runner reports failure.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self, skip_provision: bool) -> Result<()> {
        let facts = HostFacts::probe(&self.executor, &self.profile.settings.distro_marker)
            .map_err(Error::Host)?;

        match facts.distro {
            Distro::ArchLinux if skip_provision => {
                info!("provisioning skipped on request");
            }
            Distro::ArchLinux => self.provision()?,
            Distro::Unknown => {
                debug!(
                    "no marker at {:?}, skipping provisioning",
                    self.profile.settings.distro_marker.display()
                );
            }
        }

        if !playbook::runner_available(&self.executor) {
            warn!(
                "{} not found on PATH, the playbook invocation will fail with \
                 its own diagnostics",
                playbook::RUNNER_BIN
            );
        }

        playbook::run(&self.executor, &self.profile.settings.playbook).map_err(Error::Playbook)?;
        info!("bootstrap complete");

        Ok(())
    }

    /// Provision under the profile's failure policy.
    fn provision(&self) -> Result<()> {
        match self.try_provision() {
            Ok(()) => Ok(()),
            Err(error) => match self.profile.settings.on_provision_failure {
                FailurePolicy::Abort => Err(error),
                FailurePolicy::Continue => {
                    warn!("provisioning failed, continuing to playbook: {error}");
                    Ok(())
                }
            },
        }
    }

    /// Upgrade the system, install packages, and prepare the inventory.
    fn try_provision(&self) -> Result<()> {
        package::sync_upgrade(&self.executor).map_err(Error::Provision)?;
        for package_name in self.profile.package_names() {
            package::install(&self.executor, &package_name).map_err(Error::Provision)?;
        }

        let inventory = Inventory::new(
            &self.profile.settings.inventory,
            self.profile.settings.access,
        );
        inventory.ensure()?;
        inventory.edit(|edit| edit.ensure_entry(&self.profile.settings.host_entry))?;

        Ok(())
    }
}

/// Bootstrap error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Host probing refused the kernel, or `uname` itself failed.
    #[error(transparent)]
    Host(host::Error),

    /// A package manager step failed.
    #[error(transparent)]
    Provision(syscall::Error),

    /// Inventory preparation failed.
    #[error(transparent)]
    Inventory(#[from] inventory::Error),

    /// The playbook runner reported failure.
    #[error(transparent)]
    Playbook(syscall::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
