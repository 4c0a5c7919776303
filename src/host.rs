// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host operating system facts.
//!
//! The installer branches on two facts about the host: the kernel family,
//! and whether the host runs the one recognized distribution. Neither fact
//! is queried ambiently. The kernel name comes from `uname -s` through the
//! [`Execute`] seam, and the distribution check is a presence test against
//! an injected marker file path, so both branches stay testable without a
//! matching host.

use crate::syscall::{self, Execute};

use std::path::Path;
use tracing::debug;

/// Coarse kernel family derived from the name reported by `uname -s`.
///
/// Only the Linux family is recognized; every other kernel name is refused
/// with the name preserved for the diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelFamily {
    Linux,
}

impl KernelFamily {
    /// Classify a kernel name.
    ///
    /// # Errors
    ///
    /// - Return [`Error::UnsupportedOs`] for any kernel name other than
    ///   `"Linux"`, carrying the reported name.
    pub fn classify(kernel_name: impl AsRef<str>) -> Result<Self> {
        match kernel_name.as_ref() {
            "Linux" => Ok(Self::Linux),
            other => Err(Error::UnsupportedOs {
                kernel_name: other.to_string(),
            }),
        }
    }
}

/// Distribution recognized through its marker file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distro {
    ArchLinux,
    Unknown,
}

impl Distro {
    /// Recognize the distribution by marker file presence.
    pub fn recognize(marker: impl AsRef<Path>) -> Self {
        if marker.as_ref().exists() {
            Self::ArchLinux
        } else {
            Self::Unknown
        }
    }
}

/// Facts gathered about the host before provisioning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostFacts {
    /// Kernel name exactly as reported, trailing whitespace trimmed.
    pub kernel_name: String,

    /// Coarse family the kernel name maps to.
    pub family: KernelFamily,

    /// Distribution the marker file identifies.
    pub distro: Distro,
}

impl HostFacts {
    /// Probe the host for kernel family and distribution.
    ///
    /// Refuses unsupported kernels before the marker file is even looked at,
    /// so nothing else happens on a host the installer does not understand.
    ///
    /// # Errors
    ///
    /// - Return [`Error::UnsupportedOs`] if the kernel name is unrecognized.
    /// - Return [`Error::Syscall`] if `uname` cannot be invoked.
    pub fn probe(executor: &impl Execute, marker: impl AsRef<Path>) -> Result<Self> {
        let kernel_name = executor.run_quiet("uname", ["-s"])?.trim().to_string();
        let family = KernelFamily::classify(&kernel_name)?;
        let distro = Distro::recognize(&marker);
        debug!("probed host: kernel {kernel_name:?}, distribution {distro:?}");

        Ok(Self {
            kernel_name,
            family,
            distro,
        })
    }
}

/// Host detection error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Kernel name does not map to any supported family.
    #[error("Unsupported operating system: {kernel_name}")]
    UnsupportedOs { kernel_name: String },

    /// Kernel name cannot be obtained from `uname`.
    #[error(transparent)]
    Syscall(#[from] syscall::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;
    use std::{
        ffi::{OsStr, OsString},
        fs::write,
    };

    #[test]
    fn linux_kernel_is_classified() {
        assert_eq!(KernelFamily::classify("Linux").unwrap(), KernelFamily::Linux);
    }

    #[test_case("Darwin"; "macos")]
    #[test_case("FreeBSD"; "freebsd")]
    #[test_case("MINGW64_NT-10.0"; "windows msys")]
    #[test]
    fn other_kernels_are_refused(kernel_name: &str) {
        let result = KernelFamily::classify(kernel_name).unwrap_err();
        pretty_assertions::assert_eq!(
            result.to_string(),
            format!("Unsupported operating system: {kernel_name}")
        );
    }

    #[sealed_test]
    fn marker_presence_selects_distribution() -> anyhow::Result<()> {
        assert_eq!(Distro::recognize("arch-release"), Distro::Unknown);

        write("arch-release", "")?;
        assert_eq!(Distro::recognize("arch-release"), Distro::ArchLinux);

        Ok(())
    }

    struct StaticUname(&'static str);

    impl Execute for StaticUname {
        fn run_interactive(
            &self,
            _cmd: impl AsRef<OsStr>,
            _args: impl IntoIterator<Item = impl Into<OsString>>,
        ) -> syscall::Result<()> {
            Ok(())
        }

        fn run_quiet(
            &self,
            _cmd: impl AsRef<OsStr>,
            _args: impl IntoIterator<Item = impl Into<OsString>>,
        ) -> syscall::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[sealed_test]
    fn probe_trims_reported_kernel_name() -> anyhow::Result<()> {
        let facts = HostFacts::probe(&StaticUname("Linux\n"), "arch-release")?;

        let expect = HostFacts {
            kernel_name: "Linux".into(),
            family: KernelFamily::Linux,
            distro: Distro::Unknown,
        };
        assert_eq!(facts, expect);

        Ok(())
    }
}
