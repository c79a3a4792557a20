// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host package manager detection and pinned installs.

use crate::domain::version::Version;
use crate::infrastructure::executor::CommandSpec;
use crate::shared::error::{BootstrapError, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Yum,
    Dnf,
    AptGet,
}

impl PackageManager {
    /// Probe order when more than one manager is installed
    const CANDIDATES: [PackageManager; 3] =
        [PackageManager::Dnf, PackageManager::Yum, PackageManager::AptGet];

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Yum => "yum",
            PackageManager::Dnf => "dnf",
            PackageManager::AptGet => "apt-get",
        }
    }

    /// The first supported manager found on `PATH`
    pub fn detect() -> Result<Self> {
        Self::detect_with(|program| which::which(program).is_ok())
    }

    pub fn detect_with<F>(available: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        for candidate in Self::CANDIDATES {
            if available(candidate.program()) {
                debug!("Using package manager {}", candidate.program());
                return Ok(candidate);
            }
        }
        Err(BootstrapError::config_error(
            "no supported package manager found (looked for dnf, yum, apt-get)",
        ))
    }

    /// Package reference pinned to `version` in this manager's syntax
    pub fn pinned(&self, package: &str, version: &Version) -> String {
        match self {
            PackageManager::Yum | PackageManager::Dnf => format!("{}-{}", package, version),
            PackageManager::AptGet => format!("{}={}-00", package, version),
        }
    }

    pub fn install(&self, packages: &[&str], version: &Version) -> CommandSpec {
        let mut spec = CommandSpec::new(self.program()).args(["install", "-y"]);
        if *self == PackageManager::AptGet {
            spec = spec.arg("--allow-downgrades");
        }
        spec.args(packages.iter().map(|p| self.pinned(p, version)))
    }
}
