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

//! Gatekeeper for node upgrades.
//!
//! The governor observes the running version, classifies the requested
//! transition and only then lets the upgrade routines touch the host. A minor
//! upgrade first lands on the `.0` release of the target line and then runs the
//! patch routine, so every successful upgrade ends with exactly one patch step.
//!
//! Nothing is rolled back here: once a routine has started installing packages
//! a failure leaves the node partially upgraded and is returned as-is.

use crate::domain::config::schema::{select, SchemaVariant};
use crate::domain::upgrade::transition::{Classification, UpgradeTransition};
use crate::domain::version::Version;
use crate::shared::error::{BootstrapError, Result};
use tracing::info;

/// Versions reported by the two independent sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedVersions {
    pub client: Version,
    /// API server version
    pub server: Version,
    /// `kubernetesVersion` stored in the kubeadm-config ConfigMap
    pub recorded: Version,
}

impl ObservedVersions {
    /// The version the cluster is treated as running: the lower of server and
    /// recorded, so a half-finished earlier upgrade is never skipped over.
    pub fn current(&self) -> Version {
        std::cmp::min(self.server, self.recorded)
    }
}

/// Host-side steps the governor sequences
#[async_trait::async_trait]
pub trait UpgradeRoutines: Send + Sync {
    async fn observe(&self) -> Result<ObservedVersions>;

    /// Full minor-line upgrade to `staging`
    async fn minor(&self, staging: &Version) -> Result<()>;

    /// Patch-level convergence to `target`
    async fn patch(&self, target: &Version) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    pub observed: ObservedVersions,
    pub target: Version,
    pub classification: Classification,
    /// Set for minor upgrades
    pub staging: Option<Version>,
    pub variant: SchemaVariant,
}

impl UpgradePlan {
    pub fn current(&self) -> Version {
        self.observed.current()
    }

    /// Versions the routines run at, in order
    pub fn steps(&self) -> Vec<(Classification, Version)> {
        let mut steps = Vec::with_capacity(2);
        if let Some(staging) = self.staging {
            steps.push((Classification::Minor, staging));
        }
        steps.push((Classification::Patch, self.target));
        steps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub from: Version,
    pub to: Version,
    pub classification: Classification,
    pub staging: Option<Version>,
}

pub struct UpgradeGovernor<'a> {
    routines: &'a dyn UpgradeRoutines,
}

impl<'a> UpgradeGovernor<'a> {
    pub fn new(routines: &'a dyn UpgradeRoutines) -> Self {
        Self { routines }
    }

    /// Observe and classify without touching the host
    pub async fn plan(&self, target: &Version) -> Result<UpgradePlan> {
        let observed = self.routines.observe().await?;
        info!(
            "Observed client {}, server {}, recorded {}",
            observed.client, observed.server, observed.recorded
        );

        let current = observed.current();
        let classification = UpgradeTransition::new(current, *target).classify()?;
        let variant = select(target)?.variant;

        let staging = match classification {
            Classification::Minor => Some(target.minor_base()),
            Classification::Patch => None,
        };

        info!(
            "Upgrade {} -> {} classified as {} ({})",
            current, target, classification, variant
        );

        Ok(UpgradePlan {
            observed,
            target: *target,
            classification,
            staging,
            variant,
        })
    }

    pub async fn upgrade(&self, target: &Version) -> Result<UpgradeReport> {
        let plan = self.plan(target).await?;
        let from = plan.current();
        let mut current = from;

        if let Some(staging) = plan.staging {
            info!("Running minor upgrade {} -> {}", current, staging);
            self.routines.minor(&staging).await?;
            current = staging;
        }

        let convergence = UpgradeTransition::new(current, *target).classify()?;
        if convergence != Classification::Patch {
            return Err(BootstrapError::ValidationError(format!(
                "patch convergence from {} to {} is a {} transition",
                current, target, convergence
            )));
        }

        info!("Running patch upgrade {} -> {}", current, target);
        self.routines.patch(target).await?;

        info!("Upgrade to {} succeeded", target);
        Ok(UpgradeReport {
            from,
            to: *target,
            classification: plan.classification,
            staging: plan.staging,
        })
    }
}
